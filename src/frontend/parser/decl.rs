//! Variable declarations (`name S`, `name S[]..`, `name S S()`) are
//! recognised by a small shift/reduce automaton.

use tracing::trace;

use super::Parser;
use crate::error::CompilerError;
use crate::frontend::token::{Keyword, Token, TokenKind};
use crate::symbols::Variable;
use crate::types::{AtomicType, DataType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    Id,
    Type,
    BraceL,
    BraceR,
    IndexL,
    IndexR,
    Other,
}

impl Terminal {
    const COUNT: usize = 7;

    fn classify(token: &Token) -> Terminal {
        if token.atomic_type().is_some() {
            return Terminal::Type;
        }
        match &token.kind {
            TokenKind::Id(_) => Terminal::Id,
            TokenKind::Delimiter(Keyword::BraceL) => Terminal::BraceL,
            TokenKind::Delimiter(Keyword::BraceR) => Terminal::BraceR,
            TokenKind::Delimiter(Keyword::IndexL) => Terminal::IndexL,
            TokenKind::Delimiter(Keyword::IndexR) => Terminal::IndexR,
            _ => Terminal::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonTerminal {
    VarDecl,
    VarType,
    AtomicType,
    DictType,
    ArrayType,
    DimDecl,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Shift(usize),
    Reduce(usize),
    Accept,
}

struct Rule {
    lhs: NonTerminal,
    len: usize,
}

const fn rule(lhs: NonTerminal, len: usize) -> Rule {
    Rule { lhs, len }
}

/// Rule 0 is unused so rule numbers read as in the grammar:
///
/// ```text
/// 1 VarDecl    -> id VarType
/// 2 VarType    -> AtomicType
/// 3 VarType    -> DictType
/// 4 VarType    -> ArrayType
/// 5 AtomicType -> type
/// 6 DictType   -> AtomicType AtomicType ( )
/// 7 ArrayType  -> AtomicType DimDecl
/// 8 DimDecl    -> [ ] DimDecl
/// 9 DimDecl    -> [ ]
/// ```
const RULES: [Rule; 10] = [
    rule(NonTerminal::VarDecl, 0),
    rule(NonTerminal::VarDecl, 2),
    rule(NonTerminal::VarType, 1),
    rule(NonTerminal::VarType, 1),
    rule(NonTerminal::VarType, 1),
    rule(NonTerminal::AtomicType, 1),
    rule(NonTerminal::DictType, 4),
    rule(NonTerminal::ArrayType, 2),
    rule(NonTerminal::DimDecl, 3),
    rule(NonTerminal::DimDecl, 2),
];

const N: Option<Action> = None;
const fn s(state: usize) -> Option<Action> {
    Some(Action::Shift(state))
}
const fn r(rule: usize) -> Option<Action> {
    Some(Action::Reduce(rule))
}
const fn all(rule: usize) -> [Option<Action>; Terminal::COUNT] {
    [r(rule); Terminal::COUNT]
}

/// Columns: id, type, (, ), [, ], anything else.
const ACTIONS: [[Option<Action>; Terminal::COUNT]; 15] = [
    /* 0 */ [s(1), N, N, N, N, N, N],
    /* 1 */ [N, s(7), N, N, N, N, N],
    /* 2 */ [Some(Action::Accept); Terminal::COUNT],
    /* 3 */ all(1),
    /* 4 */ [r(2), s(7), r(2), r(2), s(10), r(2), r(2)],
    /* 5 */ all(3),
    /* 6 */ all(4),
    /* 7 */ all(5),
    /* 8 */ [N, N, s(11), N, N, N, N],
    /* 9 */ all(7),
    /* 10 */ [N, N, N, N, N, s(12), N],
    /* 11 */ [N, N, N, s(13), N, N, N],
    /* 12 */ [r(9), r(9), r(9), r(9), s(10), r(9), r(9)],
    /* 13 */ all(6),
    /* 14 */ all(8),
];

fn goto(state: usize, symbol: NonTerminal) -> Option<usize> {
    let next = match (state, symbol) {
        (0, NonTerminal::VarDecl) => 2,
        (1, NonTerminal::VarType) => 3,
        (1, NonTerminal::AtomicType) => 4,
        (1, NonTerminal::DictType) => 5,
        (1, NonTerminal::ArrayType) => 6,
        (4, NonTerminal::AtomicType) => 8,
        (4, NonTerminal::DimDecl) => 9,
        (12, NonTerminal::DimDecl) => 14,
        _ => return None,
    };
    Some(next)
}

/// Semantic value carried next to each state.
#[derive(Debug, Clone)]
enum Value {
    Name(String),
    Atomic(AtomicType),
    Dims(usize),
    Type(DataType),
    Decl(Variable),
    Token,
}

fn reduce(rule: usize, values: &[Value]) -> Result<Value, CompilerError> {
    let value = match (rule, values) {
        (1, [Value::Name(name), Value::Type(ty)]) => Value::Decl(Variable::new(name.clone(), *ty)),
        (2, [Value::Atomic(atomic)]) => Value::Type((*atomic).into()),
        (3 | 4, [Value::Type(ty)]) => Value::Type(*ty),
        (5, [Value::Atomic(atomic)]) => Value::Atomic(*atomic),
        (6, [Value::Atomic(key), Value::Atomic(value), _, _]) => {
            Value::Type(DataType::dict(*key, *value))
        }
        (7, [Value::Atomic(element), Value::Dims(dims)]) => {
            Value::Type(DataType::array(*dims, *element)?)
        }
        (8, [_, _, Value::Dims(dims)]) => Value::Dims(dims + 1),
        (9, [_, _]) => Value::Dims(1),
        _ => {
            return Err(CompilerError::internal(format!(
                "Declaration rule {} cannot reduce {:?}",
                rule, values
            )))
        }
    };
    Ok(value)
}

impl<'a> Parser<'a> {
    /// Returns `None` without an error when the tokens do not form a
    /// declaration; the caller restores the cursor.
    pub(super) fn parse_var_decl(&mut self) -> Result<Option<Variable>, CompilerError> {
        let mut states = vec![0usize];
        let mut values: Vec<Value> = Vec::new();

        loop {
            let state = *states
                .last()
                .ok_or_else(|| CompilerError::internal("Declaration automaton lost its state"))?;
            let token = self.tokens.current();
            let terminal = Terminal::classify(token);

            match ACTIONS[state][terminal as usize] {
                None => return Ok(None),
                Some(Action::Shift(next)) => {
                    values.push(match (&token.kind, token.atomic_type()) {
                        (TokenKind::Id(name), _) => Value::Name(name.clone()),
                        (_, Some(atomic)) => Value::Atomic(atomic),
                        _ => Value::Token,
                    });
                    states.push(next);
                    self.tokens.forward();
                }
                Some(Action::Reduce(rule)) => {
                    let Rule { lhs, len } = RULES[rule];
                    let split = values.len().checked_sub(len).ok_or_else(|| {
                        CompilerError::internal("Declaration automaton stack underflow")
                    })?;
                    trace!(state, rule, "declaration reduce");
                    let value = reduce(rule, &values[split..])?;
                    values.truncate(split);
                    states.truncate(states.len() - len);

                    let from = *states.last().ok_or_else(|| {
                        CompilerError::internal("Declaration automaton lost its state")
                    })?;
                    let next = goto(from, lhs).ok_or_else(|| {
                        CompilerError::internal(format!("No goto from state {} on {:?}", from, lhs))
                    })?;
                    states.push(next);
                    values.push(value);
                }
                Some(Action::Accept) => {
                    return match values.pop() {
                        Some(Value::Decl(variable)) => Ok(Some(variable)),
                        other => Err(CompilerError::internal(format!(
                            "Declaration automaton accepted {:?}",
                            other
                        ))),
                    }
                }
            }
        }
    }
}
