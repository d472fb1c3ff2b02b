pub mod ast;
pub mod backend;
pub mod compiler;
pub mod error;
pub mod frontend;
pub mod printer;
pub mod symbols;
pub mod types;

use ast::Program;
use compiler::Compiler;
use error::CompilerError;
use frontend::{Lexer, Token};

/// Lexes every line of `source`. Lines are numbered from 1 and empty lines
/// still count.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompilerError> {
    Lexer::new().tokenize(source)
}

/// Lexes and parses `source` with a fresh compiler context.
pub fn parse(source: &str) -> Result<Program, CompilerError> {
    let tokens = tokenize(source)?;
    Compiler::new("program")?.parse(&tokens)
}

/// Compiles `source` to ilasm text for an assembly called `program_name`.
pub fn compile(source: &str, program_name: &str) -> Result<String, CompilerError> {
    let tokens = tokenize(source)?;
    let mut compiler = Compiler::new(program_name)?;
    let program = compiler.parse(&tokens)?;
    compiler.compile(&program)?;
    compiler.code()
}
