use thiserror::Error;

use crate::frontend::Position;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilerError {
    #[error("Lexical error: {message}\n{position}")]
    Lex { message: String, position: Position },
    #[error("Syntax error: {message}{}", located(.position))]
    Syntax {
        message: String,
        position: Option<Position>,
    },
    #[error("Semantic error: {message}{}", located(.position))]
    Semantic {
        message: String,
        position: Option<Position>,
    },
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn located(position: &Option<Position>) -> String {
    match position {
        Some(position) => format!("\n{}", position),
        None => String::new(),
    }
}

impl CompilerError {
    pub fn lex(message: impl Into<String>, position: Position) -> Self {
        CompilerError::Lex {
            message: message.into(),
            position,
        }
    }

    /// Syntax error whose position is filled in by the parser entry point.
    pub fn syntax(message: impl Into<String>) -> Self {
        CompilerError::Syntax {
            message: message.into(),
            position: None,
        }
    }

    /// Semantic error whose position is filled in by the parser entry point.
    pub fn semantic(message: impl Into<String>) -> Self {
        CompilerError::Semantic {
            message: message.into(),
            position: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompilerError::Internal {
            message: message.into(),
        }
    }

    /// Attaches `at` to a deferred error. Errors that already carry a
    /// position and internal errors pass through untouched.
    pub fn at(self, at: &Position) -> Self {
        match self {
            CompilerError::Syntax {
                message,
                position: None,
            } => CompilerError::Syntax {
                message,
                position: Some(at.clone()),
            },
            CompilerError::Semantic {
                message,
                position: None,
            } => CompilerError::Semantic {
                message,
                position: Some(at.clone()),
            },
            other => other,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompilerError::Lex { message, .. }
            | CompilerError::Syntax { message, .. }
            | CompilerError::Semantic { message, .. }
            | CompilerError::Internal { message } => message,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            CompilerError::Lex { position, .. } => Some(position),
            CompilerError::Syntax { position, .. } | CompilerError::Semantic { position, .. } => {
                position.as_ref()
            }
            CompilerError::Internal { .. } => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompilerError::Internal { .. })
    }
}
