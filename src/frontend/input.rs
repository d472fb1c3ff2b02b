use std::rc::Rc;

use super::token::Position;
use crate::error::CompilerError;

pub const COMMENT_MARKER: char = '`';

/// Cursor over a single source line.
pub struct InputStream {
    line: Rc<str>,
    number: usize,
    text: String,
    offset: usize,
    positions: Vec<usize>,
}

impl InputStream {
    pub fn new(line: &str, number: usize) -> Self {
        InputStream {
            line: Rc::from(line),
            number,
            text: strip_comments(line).to_string(),
            offset: 0,
            positions: Vec::new(),
        }
    }

    pub fn tell(&self) -> usize {
        self.offset
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset.min(self.text.len());
    }

    pub fn forward(&mut self, count: usize) {
        self.seek(self.offset + count);
    }

    pub fn current(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn is_end(&self) -> bool {
        self.offset >= self.text.len()
    }

    pub fn remaining(&self) -> &str {
        &self.text[self.offset..]
    }

    pub fn skip_spaces(&mut self) {
        let skipped = self
            .remaining()
            .bytes()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        self.forward(skipped);
    }

    pub fn push_position(&mut self) {
        self.positions.push(self.offset);
    }

    /// Drops the saved offset and keeps the cursor where it is.
    pub fn pop_position(&mut self) -> Result<usize, CompilerError> {
        self.positions
            .pop()
            .ok_or_else(|| CompilerError::internal("InputStream position stack is empty"))
    }

    pub fn restore_position(&mut self) -> Result<(), CompilerError> {
        let offset = self.pop_position()?;
        self.seek(offset);
        Ok(())
    }

    pub fn position_at(&self, offset: usize) -> Position {
        let column = self.line[..offset.min(self.line.len())].chars().count();
        Position::new(self.number, column, Rc::clone(&self.line))
    }

    pub fn position(&self) -> Position {
        self.position_at(self.offset)
    }
}

/// Cuts the line at the first comment marker outside a string literal.
pub fn strip_comments(line: &str) -> &str {
    let mut inside_string = false;
    for (i, ch) in line.char_indices() {
        if ch == '"' {
            inside_string = !inside_string;
        } else if ch == COMMENT_MARKER && !inside_string {
            return &line[..i];
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_quote_aware() {
        assert_eq!(strip_comments("a% = 1 ` note"), "a% = 1 ");
        assert_eq!(strip_comments("print(\"`\") ` x"), "print(\"`\") ");
        assert_eq!(strip_comments("no comment"), "no comment");
    }

    #[test]
    fn position_stack_backtracks() {
        let mut input = InputStream::new("abc def", 1);
        input.push_position();
        input.forward(3);
        input.skip_spaces();
        assert_eq!(input.remaining(), "def");
        assert_eq!(input.position().column, 4);
        input.restore_position().unwrap();
        assert_eq!(input.tell(), 0);

        input.push_position();
        input.forward(2);
        assert_eq!(input.pop_position().unwrap(), 0);
        assert_eq!(input.current(), Some('c'));
        assert!(input.pop_position().is_err());
    }
}
