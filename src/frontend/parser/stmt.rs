use super::Parser;
use crate::ast::{Assign, Expr, Stmt};
use crate::error::CompilerError;
use crate::frontend::token::Keyword;

impl<'a> Parser<'a> {
    /// `{ statement* }`
    pub(super) fn parse_code(&mut self) -> Result<Vec<Stmt>, CompilerError> {
        self.expect(Keyword::BlockL)?;
        let mut body = Vec::new();
        while let Some(stmt) = self.parse_statement()? {
            body.push(stmt);
        }
        self.expect(Keyword::BlockR)?;
        Ok(body)
    }

    fn parse_statement(&mut self) -> Result<Option<Stmt>, CompilerError> {
        if let Some(stmt) = self.attempt(|p| p.parse_array_assign())? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.attempt(|p| p.parse_dict_assign())? {
            return Ok(Some(stmt));
        }
        if let Some(assign) = self.attempt(|p| p.parse_assign())? {
            return Ok(Some(Stmt::Assign(assign)));
        }
        if let Some(stmt) = self.parse_return()? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.parse_if()? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.parse_for()? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.parse_while()? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.parse_do_while()? {
            return Ok(Some(stmt));
        }
        self.attempt(|p| p.parse_call_stmt())
    }

    /// `name S = expr`
    pub(super) fn parse_assign(&mut self) -> Result<Option<Assign>, CompilerError> {
        let position = self.tokens.position().clone();
        let Some(target) = self.attempt(|p| p.parse_var_decl())? else {
            return Ok(None);
        };
        if !self.tokens.match_keyword(Keyword::Assign) {
            return Ok(None);
        }
        let Some(value) = self.parse_expression()? else {
            return Ok(None);
        };
        Assign::new(target, value, position).map(Some)
    }

    fn parse_array_assign(&mut self) -> Result<Option<Stmt>, CompilerError> {
        let Some(target) = self.parse_array_value()? else {
            return Ok(None);
        };
        if !self.tokens.match_keyword(Keyword::Assign) {
            return Ok(None);
        }
        let Some(value) = self.parse_expression()? else {
            return Ok(None);
        };
        Stmt::array_assign(target, value).map(Some)
    }

    fn parse_dict_assign(&mut self) -> Result<Option<Stmt>, CompilerError> {
        let Some(target) = self.parse_dict_value()? else {
            return Ok(None);
        };
        if !self.tokens.match_keyword(Keyword::Assign) {
            return Ok(None);
        }
        let Some(value) = self.parse_expression()? else {
            return Ok(None);
        };
        Stmt::dict_assign(target, value).map(Some)
    }

    fn parse_return(&mut self) -> Result<Option<Stmt>, CompilerError> {
        let Some(position) = self.match_keyword_at(Keyword::Return) else {
            return Ok(None);
        };
        let value = self.parse_expression()?;
        Ok(Some(Stmt::Return { value, position }))
    }

    fn parse_condition(&mut self) -> Result<Expr, CompilerError> {
        self.parse_expression()?
            .ok_or_else(|| CompilerError::syntax("Expected expression"))
    }

    /// `if cond { .. } [else { .. } | else if ..]`
    fn parse_if(&mut self) -> Result<Option<Stmt>, CompilerError> {
        if !self.tokens.match_keyword(Keyword::If) {
            return Ok(None);
        }
        let condition = self.parse_condition()?;
        let consequent = self.parse_code()?;

        let alternative = if self.tokens.match_keyword(Keyword::Else) {
            match self.parse_if()? {
                Some(chained) => Some(vec![chained]),
                None => Some(self.parse_code()?),
            }
        } else {
            None
        };
        Stmt::new_if(condition, consequent, alternative).map(Some)
    }

    /// `for counter = from to limit [step s] { .. }`
    fn parse_for(&mut self) -> Result<Option<Stmt>, CompilerError> {
        let Some(position) = self.match_keyword_at(Keyword::For) else {
            return Ok(None);
        };
        let from = self
            .attempt(|p| p.parse_assign())?
            .ok_or_else(|| CompilerError::syntax("Expected loop counter assignment"))?;
        self.expect(Keyword::To)?;
        let to = self.parse_condition()?;
        let step = if self.tokens.match_keyword(Keyword::Step) {
            Some(self.parse_condition()?)
        } else {
            None
        };
        let body = self.parse_code()?;
        Stmt::new_for(from, to, step, body, position).map(Some)
    }

    fn parse_while(&mut self) -> Result<Option<Stmt>, CompilerError> {
        if !self.tokens.match_keyword(Keyword::While) {
            return Ok(None);
        }
        let condition = self.parse_condition()?;
        let body = self.parse_code()?;
        Stmt::new_while(condition, body, false).map(Some)
    }

    /// `do { .. } while cond`
    fn parse_do_while(&mut self) -> Result<Option<Stmt>, CompilerError> {
        if !self.tokens.match_keyword(Keyword::Do) {
            return Ok(None);
        }
        let body = self.parse_code()?;
        self.expect(Keyword::While)?;
        let condition = self.parse_condition()?;
        Stmt::new_while(condition, body, true).map(Some)
    }

    fn parse_call_stmt(&mut self) -> Result<Option<Stmt>, CompilerError> {
        let Some(call) = self.parse_call()? else {
            return Ok(None);
        };
        if !call.return_type.is_void() {
            return Err(CompilerError::semantic(
                "In top level function calls return type must be converted to void",
            ));
        }
        Ok(Some(Stmt::Call(call)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_program, parse_with};
    use super::*;
    use crate::ast::{ConstValue, ExprKind, Item};
    use crate::printer::print_expr;
    use crate::symbols::Variable;
    use crate::types::{AtomicType, DataType};

    fn statements(source: &str) -> Vec<Stmt> {
        parse_with(source, |p| p.parse_code().map(Some))
            .unwrap()
            .unwrap_or_default()
    }

    fn body(source: &str) -> Vec<Stmt> {
        let program = parse_program(source).unwrap();
        match program.items.into_iter().next() {
            Some(Item::Function(function)) => function.body,
            other => panic!("expected a function, got {:?}", other),
        }
    }

    #[test]
    fn assignments_of_every_shape() {
        let stmts = statements(
            "{ a%[] = new array %(3)\n a%[0] = 1\n d$%() = new dict $%()\n d$%(\"k\") = 2 }",
        );
        let array = DataType::array(1, AtomicType::Int).unwrap();
        assert!(matches!(&stmts[0], Stmt::Assign(Assign { target, .. }) if target.ty == array));
        assert!(matches!(&stmts[1], Stmt::ArrayAssign { .. }));
        assert!(matches!(&stmts[2], Stmt::Assign(_)));
        assert!(matches!(&stmts[3], Stmt::DictAssign { .. }));
    }

    #[test]
    fn call_statements_discard_explicitly() {
        let stmts = statements("{ printn(\"hi\") }");
        match &stmts[..] {
            [Stmt::Call(call)] => {
                let hi = Expr::constant(ConstValue::Str("hi".to_string()));
                assert_eq!(call.name, "printn");
                assert!(call.return_type.is_void());
                assert_eq!(call.args, vec![hi]);
                assert_eq!(call.position.column, 2);
            }
            other => panic!("expected a call, got {:?}", other),
        }

        let err = parse_with("{ DoSum%(1, 2) }", |p| p.parse_code().map(Some)).unwrap_err();
        assert_eq!(
            err.message(),
            "In top level function calls return type must be converted to void"
        );
    }

    #[test]
    fn if_requires_a_bool_condition() {
        let err = parse_program("def main() { x% = 1\n if x% {} else {} }").unwrap_err();
        assert_eq!(
            err.message(),
            "If statement requires a boolean expression as its condition"
        );
    }

    #[test]
    fn else_if_chains_nest() {
        let stmts = body("def main() { if a! { } else if b! { } else { x% = 1 } }");
        match &stmts[0] {
            Stmt::If {
                alternative: Some(alternative),
                ..
            } => match &alternative[..] {
                [Stmt::If {
                    alternative: Some(last),
                    ..
                }] => assert_eq!(last.len(), 1),
                other => panic!("expected a chained if, got {:?}", other),
            },
            other => panic!("expected if/else, got {:?}", other),
        }
    }

    #[test]
    fn loops() {
        let stmts = body(
            "def main() {\n for i% = 1 to 10 step 2 { }\n while i% < 3 { i% = i% + 1 }\n \
             do { i% = i% - 1 } while i% > 0\n}",
        );
        match &stmts[0] {
            Stmt::For {
                from,
                step,
                position,
                ..
            } => {
                assert_eq!(from.target, Variable::new("i", DataType::Int));
                assert_eq!(*step, Expr::constant(ConstValue::Int(2)));
                assert_eq!((position.line, position.column), (2, 1));
                assert_eq!((from.position.line, from.position.column), (2, 5));
            }
            other => panic!("expected for, got {:?}", other),
        }
        assert!(matches!(&stmts[1], Stmt::While { do_while: false, .. }));
        assert!(matches!(&stmts[2], Stmt::While { do_while: true, .. }));

        let err = parse_program("def main() { for i% = 1 to 2.0 { } }").unwrap_err();
        assert_eq!(err.message(), "Type mismatch: int% and float#");
        let err = parse_program("def main() { for i% = 1 { } }").unwrap_err();
        assert_eq!(err.message(), "Expected 'to'");
    }

    #[test]
    fn return_value_is_optional() {
        let stmts = body("def f%() { return 1 }\n");
        match &stmts[..] {
            [Stmt::Return {
                value: Some(value),
                position,
            }] => {
                assert_eq!(print_expr(value), "Constant 1: int%\n");
                assert_eq!(position.column, 11);
            }
            other => panic!("expected a return, got {:?}", other),
        }
        let stmts = body("def f() { return }\n");
        assert!(matches!(&stmts[..], [Stmt::Return { value: None, .. }]));
    }

    #[test]
    fn unknown_statement_is_a_syntax_error() {
        let err = parse_program("def main() {\n x% + 1\n}").unwrap_err();
        assert_eq!(err.message(), "Expected '}'");
        assert!(matches!(err, CompilerError::Syntax { position: Some(_), .. }));
    }

    #[test]
    fn element_reads_inside_expressions() {
        let stmts = body("def main() { n% = a%[1] + d$%(\"k\") }");
        match &stmts[0] {
            Stmt::Assign(Assign { value, .. }) => match &value.kind {
                ExprKind::Binary { left, right, .. } => {
                    assert!(matches!(left.kind, ExprKind::ArrayValue(_)));
                    assert!(matches!(right.kind, ExprKind::DictValue(_)));
                }
                other => panic!("expected a sum, got {:?}", other),
            },
            other => panic!("expected an assignment, got {:?}", other),
        }
    }
}
