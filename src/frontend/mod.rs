mod input;
mod lexer;
pub mod parser;
mod stream;
pub mod token;

pub use lexer::{Lexer, LexicalError};
pub use parser::Parser;
pub use stream::TokenStream;
pub use token::{Keyword, Position, Token, TokenKind};
