mod build;
pub mod ops;

use std::fmt;

use crate::frontend::{Keyword, Position};
use crate::symbols::{Constant, Variable};
use crate::types::{AtomicType, DataType};

pub use ops::OperatorTable;

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(i32),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl ConstValue {
    pub fn ty(&self) -> DataType {
        match self {
            ConstValue::Int(_) => DataType::Int,
            ConstValue::Float(_) => DataType::Float,
            ConstValue::Str(_) => DataType::Str,
            ConstValue::Bool(_) => DataType::Bool,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(n) => write!(f, "{}", n),
            ConstValue::Float(n) => write!(f, "{:?}", n),
            ConstValue::Str(s) => write!(f, "\"{}\"", s),
            ConstValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::UnaryMinus => Some(UnaryOp::Neg),
            Keyword::Not => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "~",
            UnaryOp::Not => "not",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        let op = match keyword {
            Keyword::Or => BinaryOp::Or,
            Keyword::And => BinaryOp::And,
            Keyword::Equal => BinaryOp::Eq,
            Keyword::NotEq => BinaryOp::NotEq,
            Keyword::Less => BinaryOp::Less,
            Keyword::LessEq => BinaryOp::LessEq,
            Keyword::Greater => BinaryOp::Greater,
            Keyword::GreaterEq => BinaryOp::GreaterEq,
            Keyword::Plus => BinaryOp::Add,
            Keyword::Minus => BinaryOp::Sub,
            Keyword::Mul => BinaryOp::Mul,
            Keyword::Div => BinaryOp::Div,
            Keyword::Mod => BinaryOp::Mod,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "<>",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "mod",
        }
    }

    /// Comparisons produce `bool!` whatever their operand type.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Less
                | BinaryOp::LessEq
                | BinaryOp::Greater
                | BinaryOp::GreaterEq
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Constant(ConstValue),
    Variable {
        name: String,
        position: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        operand_ty: DataType,
    },
    Call(Call),
    NewArray {
        element: AtomicType,
        dimensions: Vec<Expr>,
    },
    NewDict {
        key: AtomicType,
        value: AtomicType,
    },
    ArrayValue(ArrayValue),
    DictValue(DictValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub return_type: DataType,
    pub args: Vec<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub name: String,
    pub element: AtomicType,
    pub indices: Vec<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictValue {
    pub name: String,
    pub key: AtomicType,
    pub value: AtomicType,
    pub key_expr: Box<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: Variable,
    pub value: Expr,
    pub position: Position,
}

/// Nodes that can fail in code generation carry the position of their
/// leading token so late errors still point into the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign(Assign),
    ArrayAssign {
        target: ArrayValue,
        value: Expr,
    },
    DictAssign {
        target: DictValue,
        value: Expr,
    },
    Return {
        value: Option<Expr>,
        position: Position,
    },
    If {
        condition: Expr,
        consequent: Vec<Stmt>,
        alternative: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        do_while: bool,
    },
    For {
        from: Assign,
        to: Expr,
        step: Expr,
        body: Vec<Stmt>,
        position: Position,
    },
    Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub return_type: DataType,
    pub args: Vec<Variable>,
    pub body: Vec<Stmt>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(Function),
    Global {
        variables: Vec<Variable>,
        position: Position,
    },
    Constant(Constant),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(function) => Some(function),
            _ => None,
        })
    }
}
