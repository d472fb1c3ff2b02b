use logos::Logos;
use tracing::trace;

use super::input::InputStream;
use super::token::{Keyword, Position, Token, TokenKind};
use crate::error::CompilerError;

/// Integer literals longer than this, sign included, are rejected.
pub const MAX_INT_DIGITS: usize = 10;

#[derive(Default, Debug, Clone, PartialEq)]
pub enum LexicalError {
    #[default]
    Unrecognized,
    NumberTooLong,
}

/// One token at the head of the input. Literals come before delimiters,
/// and a `~` glued to digits is the sign of a literal.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexicalError)]
enum Lexeme {
    #[regex(r"~?[0-9]+\.[0-9]+", parse_float)]
    Float(f64),

    #[regex(r"~?[0-9]+", parse_int)]
    Int(i32),

    #[regex(r#""[^"]*""#, |lex| {
        let quoted = lex.slice();
        quoted[1..quoted.len() - 1].to_string()
    })]
    Str(String),

    #[token("==", |_| Keyword::Equal)]
    #[token(">=", |_| Keyword::GreaterEq)]
    #[token("<=", |_| Keyword::LessEq)]
    #[token("<>", |_| Keyword::NotEq)]
    #[token("<", |_| Keyword::Less)]
    #[token(">", |_| Keyword::Greater)]
    #[token("$", |_| Keyword::StrType)]
    #[token("%", |_| Keyword::IntType)]
    #[token("#", |_| Keyword::FloatType)]
    #[token("!", |_| Keyword::BoolType)]
    #[token(",", |_| Keyword::Comma)]
    #[token("(", |_| Keyword::BraceL)]
    #[token(")", |_| Keyword::BraceR)]
    #[token("{", |_| Keyword::BlockL)]
    #[token("}", |_| Keyword::BlockR)]
    #[token("[", |_| Keyword::IndexL)]
    #[token("]", |_| Keyword::IndexR)]
    #[token("=", |_| Keyword::Assign)]
    #[token("+", |_| Keyword::Plus)]
    #[token("-", |_| Keyword::Minus)]
    #[token("*", |_| Keyword::Mul)]
    #[token("/", |_| Keyword::Div)]
    #[token("~", |_| Keyword::UnaryMinus)]
    Delimiter(Keyword),

    #[token("const", |_| Keyword::Const, ignore(case))]
    #[token("global", |_| Keyword::Global, ignore(case))]
    #[token("def", |_| Keyword::Def, ignore(case))]
    #[token("return", |_| Keyword::Return, ignore(case))]
    #[token("if", |_| Keyword::If, ignore(case))]
    #[token("else", |_| Keyword::Else, ignore(case))]
    #[token("do", |_| Keyword::Do, ignore(case))]
    #[token("while", |_| Keyword::While, ignore(case))]
    #[token("for", |_| Keyword::For, ignore(case))]
    #[token("to", |_| Keyword::To, ignore(case))]
    #[token("step", |_| Keyword::Step, ignore(case))]
    #[token("mod", |_| Keyword::Mod, ignore(case))]
    #[token("or", |_| Keyword::Or, ignore(case))]
    #[token("and", |_| Keyword::And, ignore(case))]
    #[token("not", |_| Keyword::Not, ignore(case))]
    #[token("new", |_| Keyword::New, ignore(case))]
    #[token("delete", |_| Keyword::Delete, ignore(case))]
    #[token("array", |_| Keyword::Array, ignore(case))]
    #[token("dict", |_| Keyword::Dict, ignore(case))]
    Keyword(Keyword),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

fn signed_literal(slice: &str) -> String {
    slice.replacen('~', "-", 1)
}

fn parse_float(lex: &mut logos::Lexer<Lexeme>) -> Result<f64, LexicalError> {
    let value: f64 = signed_literal(lex.slice())
        .parse()
        .map_err(|_| LexicalError::Unrecognized)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LexicalError::NumberTooLong)
    }
}

/// The sign counts toward the length limit and the value must fit in i32.
fn parse_int(lex: &mut logos::Lexer<Lexeme>) -> Result<i32, LexicalError> {
    let slice = lex.slice();
    if slice.len() > MAX_INT_DIGITS {
        return Err(LexicalError::NumberTooLong);
    }
    signed_literal(slice)
        .parse::<i32>()
        .map_err(|_| LexicalError::NumberTooLong)
}

impl From<Lexeme> for TokenKind {
    fn from(lexeme: Lexeme) -> Self {
        match lexeme {
            Lexeme::Float(value) => TokenKind::Float(value),
            Lexeme::Int(value) => TokenKind::Int(value),
            Lexeme::Str(value) => TokenKind::Str(value),
            Lexeme::Delimiter(k) => TokenKind::Delimiter(k),
            Lexeme::Keyword(k) => TokenKind::Keyword(k),
            Lexeme::Ident(name) => TokenKind::Id(name),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Lexer;

impl Lexer {
    pub fn new() -> Self {
        Lexer
    }

    /// Lexes every line of `source` and appends an end-of-file token.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();
        let mut last_line = (0, "");
        for (index, line) in source.lines().enumerate() {
            tokens.extend(self.parse_line(line, index + 1)?);
            last_line = (index + 1, line);
        }
        let (number, text) = last_line;
        let end = Position::new(number, text.chars().count(), text);
        tokens.push(Token::new(TokenKind::Eof, end));
        Ok(tokens)
    }

    pub fn parse_line(&self, line: &str, number: usize) -> Result<Vec<Token>, CompilerError> {
        let mut input = InputStream::new(line, number);
        let mut tokens: Vec<Token> = Vec::new();

        let mut spaced = skip_blanks(&mut input);
        while !input.is_end() {
            let token = self.next_token(&mut input)?;

            // Only delimiters may touch their neighbours, otherwise `5f6`
            // would silently become `5` and `f6`.
            if let Some(previous) = tokens.last() {
                if !spaced && !previous.is_delimiter() && !token.is_delimiter() {
                    return Err(CompilerError::lex("Lexical error", token.position));
                }
            }
            tokens.push(token);
            spaced = skip_blanks(&mut input);
        }

        trace!(line = number, count = tokens.len(), "lexed line");
        Ok(tokens)
    }

    fn next_token(&self, input: &mut InputStream) -> Result<Token, CompilerError> {
        input.push_position();
        let (lexeme, length) = {
            let mut lexer = Lexeme::lexer(input.remaining());
            let lexeme = lexer.next();
            (lexeme, lexer.span().end)
        };

        match lexeme {
            Some(Ok(lexeme)) => {
                input.forward(length);
                let start = input.pop_position()?;
                Ok(Token::new(lexeme.into(), input.position_at(start)))
            }
            Some(Err(LexicalError::NumberTooLong)) => {
                input.restore_position()?;
                Err(CompilerError::lex("Number too long", input.position()))
            }
            _ if input.current() == Some('"') => {
                input.restore_position()?;
                Err(CompilerError::lex(
                    "Unclosed double quote",
                    input.position(),
                ))
            }
            _ => {
                input.restore_position()?;
                Err(CompilerError::lex("Lexical error", input.position()))
            }
        }
    }
}

/// True if any blank was skipped.
fn skip_blanks(input: &mut InputStream) -> bool {
    let before = input.tell();
    input.skip_spaces();
    input.tell() > before
}
