mod alloc;
mod decl;
mod expr;
mod stmt;

use tracing::debug;

use super::stream::TokenStream;
use super::token::{Keyword, Position, Token};
use crate::ast::{Function, Item, OperatorTable, Program};
use crate::error::CompilerError;
use crate::symbols::{Constant, SymbolTable};
use crate::types::DataType;

pub struct Parser<'a> {
    tokens: TokenStream<'a>,
    ops: &'a OperatorTable,
    constants: &'a mut SymbolTable<Constant>,
}

impl<'a> Parser<'a> {
    /// `constants` holds the names already known to be compile-time
    /// values; `const` definitions are added to it as they are parsed.
    pub fn new(
        tokens: &'a [Token],
        ops: &'a OperatorTable,
        constants: &'a mut SymbolTable<Constant>,
    ) -> Result<Self, CompilerError> {
        Ok(Parser {
            tokens: TokenStream::new(tokens)?,
            ops,
            constants,
        })
    }

    /// Parses a whole program. Errors raised without a position get the
    /// position of the last consumed token.
    pub fn parse(&mut self) -> Result<Program, CompilerError> {
        self.parse_complete()
            .map_err(|err| err.at(&self.tokens.previous().position))
    }

    fn parse_complete(&mut self) -> Result<Program, CompilerError> {
        let program = self.parse_program()?;
        if !self.tokens.is_end() {
            let err = CompilerError::syntax("Unexpected token");
            return Err(err.at(self.tokens.position()));
        }
        self.tokens.assert_stack_empty()?;
        Ok(program)
    }

    /// Runs one speculative parse. On no match the cursor goes back to
    /// where it was; on a match or an error it stays where parsing stopped.
    fn attempt<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Option<T>, CompilerError>,
    ) -> Result<Option<T>, CompilerError> {
        self.tokens.push_position();
        match parse(self) {
            Ok(Some(value)) => {
                self.tokens.pop_position()?;
                Ok(Some(value))
            }
            Ok(None) => {
                self.tokens.restore_position()?;
                Ok(None)
            }
            Err(err) => {
                self.tokens.pop_position()?;
                Err(err)
            }
        }
    }

    /// `element (',' element)*`, or nothing at all. A comma must be
    /// followed by another element.
    fn parse_comma_list<T>(
        &mut self,
        mut element: impl FnMut(&mut Self) -> Result<Option<T>, CompilerError>,
    ) -> Result<Vec<T>, CompilerError> {
        let mut list = Vec::new();
        loop {
            match element(self)? {
                Some(value) => list.push(value),
                None if list.is_empty() => break,
                None => return Err(CompilerError::syntax("Expected element")),
            }
            if !self.tokens.match_keyword(Keyword::Comma) {
                break;
            }
        }
        Ok(list)
    }

    fn expect(&mut self, keyword: Keyword) -> Result<(), CompilerError> {
        self.tokens.expect(keyword)
    }

    /// Consumes `keyword` and returns where it was.
    fn match_keyword_at(&mut self, keyword: Keyword) -> Option<Position> {
        let at = self.tokens.position();
        self.tokens.match_keyword(keyword).then(|| at.clone())
    }

    fn parse_program(&mut self) -> Result<Program, CompilerError> {
        let mut items = Vec::new();
        while let Some(mut definition) = self.parse_definition()? {
            items.append(&mut definition);
        }
        Ok(Program { items })
    }

    fn parse_definition(&mut self) -> Result<Option<Vec<Item>>, CompilerError> {
        if let Some(function) = self.parse_function()? {
            return Ok(Some(vec![Item::Function(function)]));
        }
        if let Some(constants) = self.parse_const_decl()? {
            return Ok(Some(constants));
        }
        Ok(self.parse_global()?.map(|global| vec![global]))
    }

    /// `name S` or a bare `name`, the latter naming a void function.
    fn parse_function_name(&mut self) -> Result<Option<(String, DataType)>, CompilerError> {
        if let Some(variable) = self.attempt(|p| p.parse_var_decl())? {
            return Ok(Some((variable.name, variable.ty)));
        }
        match self.tokens.current().id() {
            Some(name) => {
                let name = name.to_string();
                self.tokens.forward();
                Ok(Some((name, DataType::Void)))
            }
            None => Ok(None),
        }
    }

    fn parse_function(&mut self) -> Result<Option<Function>, CompilerError> {
        if !self.tokens.match_keyword(Keyword::Def) {
            return Ok(None);
        }

        let position = self.tokens.position().clone();
        let (name, mut return_type) = self
            .parse_function_name()?
            .ok_or_else(|| CompilerError::syntax("Expected function name"))?;

        self.expect(Keyword::BraceL)?;
        let args = self.parse_comma_list(|p| p.attempt(|p| p.parse_var_decl()))?;
        self.expect(Keyword::BraceR)?;

        // `def Sum(a%, b%) % { .. }` puts the sigil after the arguments.
        if let Some(atomic) = self.tokens.current().atomic_type() {
            if !return_type.is_void() {
                return Err(CompilerError::syntax(format!(
                    "Return type of '{}' is given twice",
                    name
                )));
            }
            return_type = atomic.into();
            self.tokens.forward();
        }

        let body = self.parse_code()?;
        debug!(
            function = %name,
            %return_type,
            statements = body.len(),
            "parsed function"
        );

        Ok(Some(Function {
            name,
            return_type,
            args,
            body,
            position,
        }))
    }

    fn parse_global(&mut self) -> Result<Option<Item>, CompilerError> {
        let Some(position) = self.match_keyword_at(Keyword::Global) else {
            return Ok(None);
        };
        let variables = self.parse_comma_list(|p| p.attempt(|p| p.parse_var_decl()))?;
        if variables.is_empty() {
            return Err(CompilerError::syntax(
                "Expected at least one variable declaration",
            ));
        }
        Ok(Some(Item::Global {
            variables,
            position,
        }))
    }

    /// `const a% = 1, b$ = "x"`. Each constant is usable by the ones that
    /// follow it.
    fn parse_const_decl(&mut self) -> Result<Option<Vec<Item>>, CompilerError> {
        if !self.tokens.match_keyword(Keyword::Const) {
            return Ok(None);
        }

        let mut items = Vec::new();
        loop {
            let assign = match self.attempt(|p| p.parse_assign())? {
                Some(assign) => assign,
                None if items.is_empty() => {
                    return Err(CompilerError::syntax(
                        "Expected at least one constant declaration",
                    ))
                }
                None => return Err(CompilerError::syntax("Expected element")),
            };

            if !assign.target.ty.is_atomic() {
                return Err(CompilerError::semantic("Constants must have atomic type"));
            }
            let value = assign
                .value
                .as_constant()
                .cloned()
                .ok_or_else(|| CompilerError::semantic("Value of a constant must be constant"))?;

            let constant = Constant::new(assign.target.name, value);
            self.constants.define(constant.clone())?;
            items.push(Item::Constant(constant));

            if !self.tokens.match_keyword(Keyword::Comma) {
                break;
            }
        }
        Ok(Some(items))
    }
}
