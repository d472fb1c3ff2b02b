//! `new array S(e, ..)` and `new dict S S()` are parsed by a table-driven
//! predictive parser. Dimension expressions are a single terminal that
//! hands control back to the expression parser. Once `new` is consumed
//! the tokens must form an allocation.

use tracing::trace;

use super::Parser;
use crate::ast::Expr;
use crate::error::CompilerError;
use crate::frontend::token::{Keyword, Token, TokenKind};
use crate::types::AtomicType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    New,
    Array,
    Dict,
    BraceL,
    BraceR,
    Comma,
    Bool,
    Int,
    Float,
    Str,
    /// Anything an expression may start with.
    Operand,
    Other,
}

impl Terminal {
    const COUNT: usize = 12;

    fn classify(token: &Token) -> Terminal {
        match &token.kind {
            TokenKind::Id(_) | TokenKind::Int(_) | TokenKind::Float(_) | TokenKind::Str(_) => {
                Terminal::Operand
            }
            TokenKind::Keyword(keyword) | TokenKind::Delimiter(keyword) => match keyword {
                Keyword::New => Terminal::New,
                Keyword::Array => Terminal::Array,
                Keyword::Dict => Terminal::Dict,
                Keyword::BraceL => Terminal::BraceL,
                Keyword::BraceR => Terminal::BraceR,
                Keyword::Comma => Terminal::Comma,
                Keyword::BoolType => Terminal::Bool,
                Keyword::IntType => Terminal::Int,
                Keyword::FloatType => Terminal::Float,
                Keyword::StrType => Terminal::Str,
                Keyword::UnaryMinus | Keyword::Not => Terminal::Operand,
                _ => Terminal::Other,
            },
            TokenKind::Eof => Terminal::Other,
        }
    }

    fn text(self) -> &'static str {
        match self {
            Terminal::New => "new",
            Terminal::Array => "array",
            Terminal::Dict => "dict",
            Terminal::BraceL => "(",
            Terminal::BraceR => ")",
            Terminal::Comma => ",",
            Terminal::Bool => "!",
            Terminal::Int => "%",
            Terminal::Float => "#",
            Terminal::Str => "$",
            Terminal::Operand => "expression",
            Terminal::Other => "token",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonTerminal {
    OpNew,
    Alloc,
    Atomic,
    Dims,
    DimsTail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    T(Terminal),
    /// A full expression.
    Expr,
    N(NonTerminal),
}

use Symbol::{Expr as E, N, T};

/// Right-hand sides, indexed by rule number (0 is unused).
///
/// ```text
///  1 OpNew    -> new Alloc
///  2 Alloc    -> array Atomic ( Dims )
///  3 Alloc    -> dict Atomic Atomic ( )
///  4 Atomic   -> !
///  5 Atomic   -> %
///  6 Atomic   -> #
///  7 Atomic   -> $
///  8 Dims     -> Expr DimsTail
///  9 DimsTail -> , Expr DimsTail
/// 10 DimsTail ->
/// ```
const RULES: [&[Symbol]; 11] = [
    &[],
    &[T(Terminal::New), N(NonTerminal::Alloc)],
    &[
        T(Terminal::Array),
        N(NonTerminal::Atomic),
        T(Terminal::BraceL),
        N(NonTerminal::Dims),
        T(Terminal::BraceR),
    ],
    &[
        T(Terminal::Dict),
        N(NonTerminal::Atomic),
        N(NonTerminal::Atomic),
        T(Terminal::BraceL),
        T(Terminal::BraceR),
    ],
    &[T(Terminal::Bool)],
    &[T(Terminal::Int)],
    &[T(Terminal::Float)],
    &[T(Terminal::Str)],
    &[E, N(NonTerminal::DimsTail)],
    &[T(Terminal::Comma), E, N(NonTerminal::DimsTail)],
    &[],
];

/// Rule to expand for each nonterminal and lookahead, 0 when there is none.
/// Columns follow the order of `Terminal`.
const TABLE: [[u8; Terminal::COUNT]; 5] = [
    /* OpNew    */ [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    /* Alloc    */ [0, 2, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    /* Atomic   */ [0, 0, 0, 0, 0, 0, 4, 5, 6, 7, 0, 0],
    /* Dims     */ [0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 8, 0],
    /* DimsTail */ [0, 0, 0, 0, 10, 9, 0, 0, 0, 0, 0, 0],
];

fn atomic(terminal: Terminal) -> Option<AtomicType> {
    match terminal {
        Terminal::Bool => Some(AtomicType::Bool),
        Terminal::Int => Some(AtomicType::Int),
        Terminal::Float => Some(AtomicType::Float),
        Terminal::Str => Some(AtomicType::Str),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    /// Returns `None` when the next token is not `new`. Any later mismatch
    /// is a syntax error at the offending token.
    pub(super) fn parse_new(&mut self) -> Result<Option<Expr>, CompilerError> {
        let mut stack = vec![N(NonTerminal::OpNew)];
        let mut is_dict = false;
        let mut atomics = Vec::new();
        let mut dimensions = Vec::new();

        while let Some(symbol) = stack.pop() {
            match symbol {
                N(nonterminal) => {
                    let lookahead = Terminal::classify(self.tokens.current());
                    let rule = TABLE[nonterminal as usize][lookahead as usize] as usize;
                    if rule == 0 && nonterminal == NonTerminal::OpNew {
                        return Ok(None);
                    }
                    if rule == 0 {
                        return Err(self.unexpected(expected(nonterminal, is_dict)));
                    }
                    trace!(rule, ?lookahead, "allocation expand");
                    stack.extend(RULES[rule].iter().rev());
                }
                E => match self.parse_expression()? {
                    Some(dimension) => dimensions.push(dimension),
                    None if dimensions.is_empty() => {
                        return Err(self.unexpected("Expected expression"));
                    }
                    None => return Err(self.unexpected("Expected element")),
                },
                T(terminal) => {
                    if Terminal::classify(self.tokens.current()) != terminal {
                        let message = format!("Expected '{}'", terminal.text());
                        return Err(self.unexpected(&message));
                    }
                    self.tokens.forward();
                    match terminal {
                        Terminal::Dict => is_dict = true,
                        _ => atomics.extend(atomic(terminal)),
                    }
                }
            }
        }

        let expr = match (is_dict, atomics.as_slice()) {
            (true, &[key, value]) => Expr::new_dict(key, value),
            (false, &[element]) => Expr::new_array(element, dimensions)?,
            _ => {
                return Err(CompilerError::internal(format!(
                    "Allocation parsed with element types {:?}",
                    atomics
                )))
            }
        };
        Ok(Some(expr))
    }

    fn unexpected(&self, message: &str) -> CompilerError {
        CompilerError::syntax(message).at(self.tokens.position())
    }
}

fn expected(nonterminal: NonTerminal, is_dict: bool) -> &'static str {
    match nonterminal {
        NonTerminal::OpNew => "Expected 'new'",
        NonTerminal::Alloc => "Expected 'array' or 'dict'",
        NonTerminal::Atomic if is_dict => "Expected key type and value type",
        NonTerminal::Atomic => "Expected array type",
        NonTerminal::Dims => "Only 1,2,3 and 4-dimension arrays are supported",
        NonTerminal::DimsTail => "Expected ')'",
    }
}
