//! Which operators apply to which atomic types, and how constant
//! operands fold.
//!
//! ```text
//!           or and == <> <  <= >  >= +  -  *  /  mod
//!  string   -  -   +  +  -  -  -  -  +  -  -  -  -
//!  int      +  +   +  +  +  +  +  +  +  +  +  +  +
//!  float    -  -   +  +  +  +  +  +  +  +  +  +  -
//!  bool     +  +   +  +  -  -  -  -  -  -  -  -  -
//! ```
//! `or`/`and` are bitwise on ints and logical on bools.

use std::collections::HashMap;

use super::build::type_mismatch;
use super::{BinaryOp, ConstValue, Expr, ExprKind, UnaryOp};
use crate::error::CompilerError;
use crate::types::{AtomicType, DataType};

type Fold = fn(BinaryOp, &ConstValue, &ConstValue) -> Result<ConstValue, CompilerError>;

pub struct OperatorTable {
    entries: HashMap<(AtomicType, BinaryOp), Fold>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorTable {
    pub fn new() -> Self {
        use BinaryOp::*;

        let mut entries: HashMap<(AtomicType, BinaryOp), Fold> = HashMap::new();
        let mut allow = |ty: AtomicType, ops: &[BinaryOp], fold: Fold| {
            for op in ops {
                entries.insert((ty, *op), fold);
            }
        };

        let comparisons = [Eq, NotEq, Less, LessEq, Greater, GreaterEq];
        let arithmetic = [Add, Sub, Mul, Div];

        allow(AtomicType::Int, &comparisons, fold_int);
        allow(AtomicType::Int, &arithmetic, fold_int);
        allow(AtomicType::Int, &[Or, And, Mod], fold_int);
        allow(AtomicType::Float, &comparisons, fold_float);
        allow(AtomicType::Float, &arithmetic, fold_float);
        allow(AtomicType::Str, &[Eq, NotEq, Add], fold_str);
        allow(AtomicType::Bool, &[Or, And, Eq, NotEq], fold_bool);

        OperatorTable { entries }
    }

    fn fold_for(&self, ty: &DataType, op: BinaryOp) -> Option<Fold> {
        ty.atomic()
            .and_then(|atomic| self.entries.get(&(atomic, op)).copied())
    }

    /// Type-checks `left op right`, folding it when both sides are known.
    pub fn create_binary(
        &self,
        left: Expr,
        op: BinaryOp,
        right: Expr,
    ) -> Result<Expr, CompilerError> {
        if left.ty != right.ty {
            return Err(type_mismatch(&left.ty, &right.ty));
        }
        let operand_ty = left.ty;
        let fold = self
            .fold_for(&operand_ty, op)
            .ok_or_else(|| invalid_operator(op.symbol(), &operand_ty))?;

        if let (Some(a), Some(b)) = (left.as_constant(), right.as_constant()) {
            return Ok(Expr::constant(fold(op, a, b)?));
        }

        if operand_ty == DataType::Bool && matches!(op, BinaryOp::And | BinaryOp::Or) {
            match (bool_value(&left), bool_value(&right)) {
                (Some(value), _) => return Ok(absorb(op, value, right)),
                (_, Some(value)) => return Ok(absorb(op, value, left)),
                _ => {}
            }
        }

        let ty = if op.is_comparison() {
            DataType::Bool
        } else {
            operand_ty
        };
        Ok(Expr {
            kind: ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                operand_ty,
            },
            ty,
        })
    }

    /// `~` negates numbers and `not` inverts bools.
    pub fn create_unary(&self, op: UnaryOp, operand: Expr) -> Result<Expr, CompilerError> {
        let allowed = match op {
            UnaryOp::Neg => operand.ty.is_numeric(),
            UnaryOp::Not => operand.ty == DataType::Bool,
        };
        if !allowed {
            return Err(invalid_operator(op.symbol(), &operand.ty));
        }

        let folded = match (op, operand.as_constant()) {
            (UnaryOp::Neg, Some(ConstValue::Int(n))) => Some(ConstValue::Int(n.wrapping_neg())),
            (UnaryOp::Neg, Some(ConstValue::Float(n))) => Some(ConstValue::Float(-n)),
            (UnaryOp::Not, Some(ConstValue::Bool(b))) => Some(ConstValue::Bool(!b)),
            _ => None,
        };
        if let Some(value) = folded {
            return Ok(Expr::constant(value));
        }

        let ty = operand.ty;
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        })
    }
}

fn bool_value(expr: &Expr) -> Option<bool> {
    match expr.as_constant() {
        Some(ConstValue::Bool(value)) => Some(*value),
        _ => None,
    }
}

/// `false and x` is false, `true or x` is true, otherwise the result is `x`.
fn absorb(op: BinaryOp, known: bool, other: Expr) -> Expr {
    match (op, known) {
        (BinaryOp::And, false) => Expr::constant(ConstValue::Bool(false)),
        (BinaryOp::Or, true) => Expr::constant(ConstValue::Bool(true)),
        _ => other,
    }
}

fn invalid_operator(symbol: &str, ty: &DataType) -> CompilerError {
    CompilerError::semantic(format!(
        "Operator '{}' cannot be applied to type {}",
        symbol, ty
    ))
}

fn division_by_zero() -> CompilerError {
    CompilerError::semantic("Division by zero")
}

fn operands_mismatch(op: BinaryOp) -> CompilerError {
    CompilerError::internal(format!("Constant operands of '{}' disagree", op.symbol()))
}

fn compare<T: PartialOrd>(op: BinaryOp, a: T, b: T) -> Option<ConstValue> {
    let result = match op {
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        BinaryOp::Less => a < b,
        BinaryOp::LessEq => a <= b,
        BinaryOp::Greater => a > b,
        BinaryOp::GreaterEq => a >= b,
        _ => return None,
    };
    Some(ConstValue::Bool(result))
}

fn fold_int(op: BinaryOp, a: &ConstValue, b: &ConstValue) -> Result<ConstValue, CompilerError> {
    let (a, b) = match (a, b) {
        (ConstValue::Int(a), ConstValue::Int(b)) => (*a, *b),
        _ => return Err(operands_mismatch(op)),
    };
    if let Some(result) = compare(op, a, b) {
        return Ok(result);
    }
    let value = match op {
        BinaryOp::Or => a | b,
        BinaryOp::And => a & b,
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(division_by_zero()),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Mod => a.wrapping_rem(b),
        _ => return Err(operands_mismatch(op)),
    };
    Ok(ConstValue::Int(value))
}

fn fold_float(op: BinaryOp, a: &ConstValue, b: &ConstValue) -> Result<ConstValue, CompilerError> {
    let (a, b) = match (a, b) {
        (ConstValue::Float(a), ConstValue::Float(b)) => (*a, *b),
        _ => return Err(operands_mismatch(op)),
    };
    if let Some(result) = compare(op, a, b) {
        return Ok(result);
    }
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => return Err(division_by_zero()),
        BinaryOp::Div => a / b,
        _ => return Err(operands_mismatch(op)),
    };
    if !value.is_finite() {
        return Err(CompilerError::semantic("Floating point overflow"));
    }
    Ok(ConstValue::Float(value))
}

fn fold_str(op: BinaryOp, a: &ConstValue, b: &ConstValue) -> Result<ConstValue, CompilerError> {
    let (a, b) = match (a, b) {
        (ConstValue::Str(a), ConstValue::Str(b)) => (a, b),
        _ => return Err(operands_mismatch(op)),
    };
    match op {
        BinaryOp::Eq => Ok(ConstValue::Bool(a == b)),
        BinaryOp::NotEq => Ok(ConstValue::Bool(a != b)),
        BinaryOp::Add => Ok(ConstValue::Str(format!("{}{}", a, b))),
        _ => Err(operands_mismatch(op)),
    }
}

fn fold_bool(op: BinaryOp, a: &ConstValue, b: &ConstValue) -> Result<ConstValue, CompilerError> {
    let (a, b) = match (a, b) {
        (ConstValue::Bool(a), ConstValue::Bool(b)) => (*a, *b),
        _ => return Err(operands_mismatch(op)),
    };
    let value = match op {
        BinaryOp::Or => a || b,
        BinaryOp::And => a && b,
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        _ => return Err(operands_mismatch(op)),
    };
    Ok(ConstValue::Bool(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Position;

    fn int(n: i32) -> Expr {
        Expr::constant(ConstValue::Int(n))
    }

    fn float(n: f64) -> Expr {
        Expr::constant(ConstValue::Float(n))
    }

    fn boolean(b: bool) -> Expr {
        Expr::constant(ConstValue::Bool(b))
    }

    fn variable(name: &str, ty: DataType) -> Expr {
        Expr::variable(name, ty, Position::new(1, 0, name))
    }

    fn flag() -> Expr {
        variable("flag", DataType::Bool)
    }

    #[test]
    fn folds_constants_natively() {
        let table = OperatorTable::new();
        assert_eq!(
            table.create_binary(int(6), BinaryOp::Mul, int(7)).unwrap(),
            int(42)
        );
        assert_eq!(
            table.create_binary(int(7), BinaryOp::Mod, int(4)).unwrap(),
            int(3)
        );
        assert_eq!(
            table.create_binary(int(12), BinaryOp::And, int(10)).unwrap(),
            int(8)
        );
        assert_eq!(
            table.create_binary(int(i32::MAX), BinaryOp::Add, int(1)).unwrap(),
            int(i32::MIN)
        );
        assert_eq!(
            table.create_binary(int(2), BinaryOp::Less, int(3)).unwrap(),
            boolean(true)
        );
        assert_eq!(
            table
                .create_binary(
                    Expr::constant(ConstValue::Str("ab".into())),
                    BinaryOp::Add,
                    Expr::constant(ConstValue::Str("cd".into()))
                )
                .unwrap(),
            Expr::constant(ConstValue::Str("abcd".into()))
        );
        assert_eq!(
            table.create_binary(float(1.0), BinaryOp::Div, float(4.0)).unwrap(),
            float(0.25)
        );
    }

    #[test]
    fn division_by_zero_is_a_semantic_error() {
        let table = OperatorTable::new();
        for op in [BinaryOp::Div, BinaryOp::Mod] {
            let err = table.create_binary(int(10), op, int(0)).unwrap_err();
            assert_eq!(err.message(), "Division by zero");
            assert!(!err.is_internal());
        }
        let err = table.create_binary(float(1.0), BinaryOp::Div, float(0.0)).unwrap_err();
        assert_eq!(err.message(), "Division by zero");
    }

    #[test]
    fn float_overflow_is_a_semantic_error() {
        let table = OperatorTable::new();
        let err = table.create_binary(float(1e300), BinaryOp::Mul, float(1e300)).unwrap_err();
        assert_eq!(err.message(), "Floating point overflow");
        assert!(!err.is_internal());

        let err = table.create_binary(float(1e300), BinaryOp::Div, float(1e-300)).unwrap_err();
        assert_eq!(err.message(), "Floating point overflow");
        let big = table.create_binary(float(1e300), BinaryOp::Mul, float(10.0)).unwrap();
        assert!(matches!(big.as_constant(), Some(ConstValue::Float(n)) if n.is_finite()));
    }

    #[test]
    fn boolean_absorption() {
        let table = OperatorTable::new();
        let and = BinaryOp::And;
        let or = BinaryOp::Or;
        assert_eq!(
            table.create_binary(boolean(true), and, flag()).unwrap(),
            flag()
        );
        assert_eq!(
            table.create_binary(flag(), and, boolean(false)).unwrap(),
            boolean(false)
        );
        assert_eq!(
            table.create_binary(boolean(false), or, flag()).unwrap(),
            flag()
        );
        assert_eq!(
            table.create_binary(flag(), or, boolean(true)).unwrap(),
            boolean(true)
        );
    }

    #[test]
    fn mismatched_and_unsupported_operands() {
        let table = OperatorTable::new();
        let err = table.create_binary(int(1), BinaryOp::Add, float(1.0)).unwrap_err();
        assert_eq!(err.message(), "Type mismatch: int% and float#");

        let f = variable("f", DataType::Float);
        let g = variable("g", DataType::Float);
        let err = table.create_binary(f, BinaryOp::Mod, g).unwrap_err();
        assert_eq!(
            err.message(),
            "Operator 'mod' cannot be applied to type float#"
        );

        let s = Expr::constant(ConstValue::Str("a".into()));
        let err = table.create_binary(s.clone(), BinaryOp::Less, s).unwrap_err();
        assert_eq!(
            err.message(),
            "Operator '<' cannot be applied to type string$"
        );
    }

    #[test]
    fn comparisons_yield_bool() {
        let table = OperatorTable::new();
        let a = variable("a", DataType::Float);
        let b = variable("b", DataType::Float);
        let expr = table.create_binary(a, BinaryOp::GreaterEq, b).unwrap();
        assert_eq!(expr.ty, DataType::Bool);
        match expr.kind {
            ExprKind::Binary { operand_ty, .. } => assert_eq!(operand_ty, DataType::Float),
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn unary_operators() {
        let table = OperatorTable::new();
        assert_eq!(table.create_unary(UnaryOp::Neg, int(5)).unwrap(), int(-5));
        assert_eq!(
            table.create_unary(UnaryOp::Not, boolean(true)).unwrap(),
            boolean(false)
        );
        let err = table.create_unary(UnaryOp::Neg, boolean(true)).unwrap_err();
        assert_eq!(
            err.message(),
            "Operator '~' cannot be applied to type bool!"
        );
        let err = table.create_unary(UnaryOp::Not, int(1)).unwrap_err();
        assert_eq!(
            err.message(),
            "Operator 'not' cannot be applied to type int%"
        );
        let neg = table.create_unary(UnaryOp::Neg, variable("x", DataType::Float)).unwrap();
        assert_eq!(neg.ty, DataType::Float);
    }
}
