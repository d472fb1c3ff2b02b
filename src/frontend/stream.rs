use super::token::{Keyword, Position, Token};
use crate::error::CompilerError;

/// Cursor over the token list with a stack of saved offsets for
/// speculative parsing. The last token is always end-of-file.
pub struct TokenStream<'a> {
    tokens: &'a [Token],
    offset: usize,
    positions: Vec<usize>,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token]) -> Result<Self, CompilerError> {
        match tokens.last() {
            Some(last) if last.is_eof() => Ok(TokenStream {
                tokens,
                offset: 0,
                positions: Vec::new(),
            }),
            _ => Err(CompilerError::internal(
                "Token sequence must end with an EOF token",
            )),
        }
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset.min(self.tokens.len() - 1);
    }

    pub fn forward(&mut self) {
        self.seek(self.offset + 1);
    }

    pub fn current(&self) -> &'a Token {
        &self.tokens[self.offset]
    }

    /// The most recently consumed token. Before anything is consumed this
    /// is the first token.
    pub fn previous(&self) -> &'a Token {
        &self.tokens[self.offset.saturating_sub(1)]
    }

    pub fn is_end(&self) -> bool {
        self.current().is_eof()
    }

    pub fn check(&self, keyword: Keyword) -> bool {
        self.current().is_keyword(keyword)
    }

    pub fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check(keyword) {
            self.forward();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, keyword: Keyword) -> Result<(), CompilerError> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            Err(CompilerError::syntax(format!("Expected '{}'", keyword)))
        }
    }

    pub fn push_position(&mut self) {
        self.positions.push(self.offset);
    }

    pub fn pop_position(&mut self) -> Result<usize, CompilerError> {
        self.positions
            .pop()
            .ok_or_else(|| CompilerError::internal("TokenStream position stack is empty"))
    }

    pub fn restore_position(&mut self) -> Result<(), CompilerError> {
        let offset = self.pop_position()?;
        self.seek(offset);
        Ok(())
    }

    pub fn assert_stack_empty(&self) -> Result<(), CompilerError> {
        if self.positions.is_empty() {
            Ok(())
        } else {
            Err(CompilerError::internal(format!(
                "TokenStream position stack holds {} entries after parsing",
                self.positions.len()
            )))
        }
    }

    pub fn position(&self) -> &'a Position {
        &self.current().position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Lexer;

    #[test]
    fn backtracking_and_previous() {
        let tokens = Lexer::new().tokenize("a% = 1").unwrap();
        let mut stream = TokenStream::new(&tokens).unwrap();

        stream.push_position();
        stream.forward();
        stream.forward();
        assert!(stream.check(Keyword::Assign));
        assert!(stream.previous().is_keyword(Keyword::IntType));
        stream.restore_position().unwrap();
        assert_eq!(stream.current().id(), Some("a"));
        stream.assert_stack_empty().unwrap();

        stream.push_position();
        assert!(stream.assert_stack_empty().is_err());
        stream.pop_position().unwrap();
    }

    #[test]
    fn cursor_stops_at_eof() {
        let tokens = Lexer::new().tokenize("x").unwrap();
        let mut stream = TokenStream::new(&tokens).unwrap();
        stream.forward();
        stream.forward();
        stream.forward();
        assert!(stream.is_end());
        assert!(stream.current().is_eof());
    }
}
