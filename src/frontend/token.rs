use std::fmt;
use std::rc::Rc;

use crate::types::AtomicType;

/// Where a token starts: the whole source line, its 1-based number and
/// the 0-based column inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub text: Rc<str>,
}

impl Position {
    pub fn new(line: usize, column: usize, text: impl Into<Rc<str>>) -> Self {
        Position {
            line,
            column,
            text: text.into(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let caret: String = self
            .text
            .chars()
            .take(self.column)
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        write!(f, "line {}:\n{}\n{}^", self.line, self.text, caret)
    }
}

/// Reserved words and delimiters share one vocabulary, the token kind
/// tells which of the two was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Const,
    Global,
    Def,
    Return,
    If,
    Else,
    Do,
    While,
    For,
    To,
    Step,
    Mod,
    Or,
    And,
    Not,
    New,
    Delete,
    Array,
    Dict,

    Assign,
    Comma,
    BraceL,
    BraceR,
    BlockL,
    BlockR,
    IndexL,
    IndexR,
    UnaryMinus,
    Plus,
    Minus,
    Mul,
    Div,
    Less,
    Greater,
    Equal,
    GreaterEq,
    LessEq,
    NotEq,
    StrType,
    IntType,
    FloatType,
    BoolType,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Const => "const",
            Keyword::Global => "global",
            Keyword::Def => "def",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::Do => "do",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::To => "to",
            Keyword::Step => "step",
            Keyword::Mod => "mod",
            Keyword::Or => "or",
            Keyword::And => "and",
            Keyword::Not => "not",
            Keyword::New => "new",
            Keyword::Delete => "delete",
            Keyword::Array => "array",
            Keyword::Dict => "dict",
            Keyword::Assign => "=",
            Keyword::Comma => ",",
            Keyword::BraceL => "(",
            Keyword::BraceR => ")",
            Keyword::BlockL => "{",
            Keyword::BlockR => "}",
            Keyword::IndexL => "[",
            Keyword::IndexR => "]",
            Keyword::UnaryMinus => "~",
            Keyword::Plus => "+",
            Keyword::Minus => "-",
            Keyword::Mul => "*",
            Keyword::Div => "/",
            Keyword::Less => "<",
            Keyword::Greater => ">",
            Keyword::Equal => "==",
            Keyword::GreaterEq => ">=",
            Keyword::LessEq => "<=",
            Keyword::NotEq => "<>",
            Keyword::StrType => "$",
            Keyword::IntType => "%",
            Keyword::FloatType => "#",
            Keyword::BoolType => "!",
        }
    }

    /// The atomic type named by a sigil delimiter.
    pub fn atomic_type(self) -> Option<AtomicType> {
        match self {
            Keyword::StrType => Some(AtomicType::Str),
            Keyword::IntType => Some(AtomicType::Int),
            Keyword::FloatType => Some(AtomicType::Float),
            Keyword::BoolType => Some(AtomicType::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Eof,
    Int(i32),
    Float(f64),
    Str(String),
    Id(String),
    Keyword(Keyword),
    Delimiter(Keyword),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Token { kind, position }
    }

    /// Keywords and delimiters both answer here.
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        match &self.kind {
            TokenKind::Keyword(k) | TokenKind::Delimiter(k) => *k == keyword,
            _ => false,
        }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(k) | TokenKind::Delimiter(k) => Some(*k),
            _ => None,
        }
    }

    pub fn is_delimiter(&self) -> bool {
        matches!(self.kind, TokenKind::Delimiter(_))
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn id(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Id(name) => Some(name),
            _ => None,
        }
    }

    /// The atomic type if this is a sigil delimiter.
    pub fn atomic_type(&self) -> Option<AtomicType> {
        match &self.kind {
            TokenKind::Delimiter(k) => k.atomic_type(),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::Int(n) => write!(f, "INT {}", n),
            TokenKind::Float(n) => write!(f, "FLOAT {:?}", n),
            TokenKind::Str(s) => write!(f, "STRING \"{}\"", s),
            TokenKind::Id(name) => write!(f, "ID {}", name),
            TokenKind::Keyword(k) => write!(f, "KEYWORD {}", k),
            TokenKind::Delimiter(k) => write!(f, "DELIMITER {}", k),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}\t{}",
            self.position.line,
            self.position.column + 1,
            self.kind
        )
    }
}
