use super::Parser;
use crate::ast::{ArrayValue, BinaryOp, Call, ConstValue, DictValue, Expr, UnaryOp};
use crate::error::CompilerError;
use crate::frontend::token::{Keyword, Position, TokenKind};
use crate::symbols::Variable;

/// Binary precedence, loosest first. Every level is left associative.
fn binary_level(keyword: Keyword) -> Option<u8> {
    let level = match keyword {
        Keyword::Or => 0,
        Keyword::And => 1,
        Keyword::Equal | Keyword::NotEq => 2,
        Keyword::Less | Keyword::LessEq | Keyword::Greater | Keyword::GreaterEq => 3,
        Keyword::Plus | Keyword::Minus => 4,
        Keyword::Mul | Keyword::Div | Keyword::Mod => 5,
        _ => return None,
    };
    Some(level)
}

const TIGHTEST_LEVEL: u8 = 5;

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> Result<Option<Expr>, CompilerError> {
        self.parse_binary(0)
    }

    /// One precedence level. When an operator is not followed by an
    /// operand the operator is left in place for the caller.
    fn parse_binary(&mut self, level: u8) -> Result<Option<Expr>, CompilerError> {
        if level > TIGHTEST_LEVEL {
            return self.parse_primary();
        }

        let Some(mut left) = self.parse_binary(level + 1)? else {
            return Ok(None);
        };

        while let Some(op) = self.binary_operator(level) {
            let right = self.attempt(|p| {
                p.tokens.forward();
                p.parse_binary(level + 1)
            })?;
            match right {
                Some(right) => left = self.ops.create_binary(left, op, right)?,
                None => break,
            }
        }
        Ok(Some(left))
    }

    fn binary_operator(&self, level: u8) -> Option<BinaryOp> {
        let keyword = self.tokens.current().keyword()?;
        if binary_level(keyword)? == level {
            BinaryOp::from_keyword(keyword)
        } else {
            None
        }
    }

    pub(super) fn parse_primary(&mut self) -> Result<Option<Expr>, CompilerError> {
        let keyword = self.tokens.current().keyword();
        if let Some(op) = keyword.and_then(UnaryOp::from_keyword) {
            self.tokens.forward();
            let operand = self
                .parse_primary()?
                .ok_or_else(|| CompilerError::syntax("Expected expression"))?;
            return self.ops.create_unary(op, operand).map(Some);
        }

        if self.tokens.match_keyword(Keyword::BraceL) {
            let expr = self
                .parse_expression()?
                .ok_or_else(|| CompilerError::syntax("Expected expression"))?;
            self.expect(Keyword::BraceR)?;
            return Ok(Some(expr));
        }

        if let Some(call) = self.attempt(|p| p.parse_call())? {
            return Ok(Some(Expr::call(call)));
        }
        if let Some(value) = self.attempt(|p| p.parse_dict_value())? {
            return Ok(Some(Expr::dict_value(value)));
        }
        if let Some(value) = self.attempt(|p| p.parse_array_value())? {
            return Ok(Some(Expr::array_value(value)));
        }
        if let Some(alloc) = self.attempt(|p| p.parse_new())? {
            return Ok(Some(alloc));
        }
        let position = self.tokens.position();
        if let Some(variable) = self.attempt(|p| p.parse_var_decl())? {
            return Ok(Some(self.variable_reference(variable, position)));
        }
        Ok(self.parse_literal())
    }

    /// Known constants are substituted by their value.
    fn variable_reference(&self, variable: Variable, position: &Position) -> Expr {
        match self.constants.lookup(&variable.name) {
            Some(constant) if constant.ty() == variable.ty => {
                Expr::constant(constant.value.clone())
            }
            _ => Expr::variable(variable.name, variable.ty, position.clone()),
        }
    }

    fn parse_literal(&mut self) -> Option<Expr> {
        let value = match &self.tokens.current().kind {
            TokenKind::Int(n) => ConstValue::Int(*n),
            TokenKind::Float(n) => ConstValue::Float(*n),
            TokenKind::Str(s) => ConstValue::Str(s.clone()),
            _ => return None,
        };
        self.tokens.forward();
        Some(Expr::constant(value))
    }

    /// `name S(args)` or `name(args)`.
    pub(super) fn parse_call(&mut self) -> Result<Option<Call>, CompilerError> {
        let position = self.tokens.position().clone();
        let Some((name, return_type)) = self.parse_function_name()? else {
            return Ok(None);
        };
        if !self.tokens.match_keyword(Keyword::BraceL) {
            return Ok(None);
        }
        let args = self.parse_comma_list(|p| p.parse_expression())?;
        if !self.tokens.match_keyword(Keyword::BraceR) {
            return Ok(None);
        }
        Ok(Some(Call {
            name,
            return_type,
            args,
            position,
        }))
    }

    /// `name K V(key)`.
    pub(super) fn parse_dict_value(&mut self) -> Result<Option<DictValue>, CompilerError> {
        let position = self.tokens.position().clone();
        let Some(name) = self.tokens.current().id().map(str::to_string) else {
            return Ok(None);
        };
        self.tokens.forward();
        let Some(key) = self.tokens.current().atomic_type() else {
            return Ok(None);
        };
        self.tokens.forward();
        let Some(value) = self.tokens.current().atomic_type() else {
            return Ok(None);
        };
        self.tokens.forward();

        if !self.tokens.match_keyword(Keyword::BraceL) {
            return Ok(None);
        }
        let Some(key_expr) = self.parse_expression()? else {
            return Ok(None);
        };
        if !self.tokens.match_keyword(Keyword::BraceR) {
            return Ok(None);
        }
        DictValue::new(name, key, value, key_expr, position).map(Some)
    }

    /// `name S[i][j]..` with at least one index.
    pub(super) fn parse_array_value(&mut self) -> Result<Option<ArrayValue>, CompilerError> {
        let position = self.tokens.position().clone();
        let Some(name) = self.tokens.current().id().map(str::to_string) else {
            return Ok(None);
        };
        self.tokens.forward();
        let Some(element) = self.tokens.current().atomic_type() else {
            return Ok(None);
        };
        self.tokens.forward();

        let mut indices = Vec::new();
        while self.tokens.match_keyword(Keyword::IndexL) {
            let Some(index) = self.parse_expression()? else {
                return Ok(None);
            };
            self.expect(Keyword::IndexR)?;
            indices.push(index);
        }
        if indices.is_empty() {
            return Ok(None);
        }
        ArrayValue::new(name, element, indices, position).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_with;
    use super::*;
    use crate::ast::ExprKind;
    use crate::printer::print_expr;
    use crate::types::{AtomicType, DataType};

    fn expr(source: &str) -> Expr {
        parse_with(source, |p| p.parse_expression())
            .unwrap()
            .unwrap_or_else(|| panic!("no expression in {:?}", source))
    }

    fn tree(source: &str) -> String {
        print_expr(&expr(source))
    }

    fn int(n: i32) -> Expr {
        Expr::constant(ConstValue::Int(n))
    }

    #[test]
    fn constant_subexpressions_fold() {
        assert_eq!(expr("2 + 3 * 4"), int(14));
        assert_eq!(expr("(2 + 3) * 4"), int(20));
        assert_eq!(expr("10 - 4 - 3"), int(3));
        assert_eq!(expr("~(7 mod 4)"), int(-3));
        assert_eq!(
            expr("1 < 2 and not false!"),
            Expr::constant(ConstValue::Bool(true))
        );
        assert_eq!(
            expr("\"ab\" + \"cd\""),
            Expr::constant(ConstValue::Str("abcd".to_string()))
        );
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(
            tree("a% + b% * 2"),
            "Binary +: int%\n  Variable a: int%\n  Binary *: int%\n    \
             Variable b: int%\n    Constant 2: int%\n"
        );
        assert_eq!(
            tree("a% - b% - 1"),
            "Binary -: int%\n  Binary -: int%\n    Variable a: int%\n    \
             Variable b: int%\n  Constant 1: int%\n"
        );
        assert_eq!(
            tree("a% < b%"),
            "Binary <: bool!\n  Variable a: int%\n  Variable b: int%\n"
        );
    }

    #[test]
    fn constant_names_become_values() {
        assert_eq!(expr("true!"), Expr::constant(ConstValue::Bool(true)));
        assert_eq!(tree("true%"), "Variable true: int%\n");
    }

    #[test]
    fn variables_remember_where_they_start() {
        match expr("1 + x%").kind {
            ExprKind::Binary { right, .. } => match right.kind {
                ExprKind::Variable { name, position } => {
                    assert_eq!(name, "x");
                    assert_eq!((position.line, position.column), (1, 4));
                    assert_eq!(&*position.text, "1 + x%");
                }
                other => panic!("expected a variable, got {:?}", other),
            },
            other => panic!("expected a sum, got {:?}", other),
        }
    }

    #[test]
    fn calls_and_element_access() {
        let call = expr("DoSum%(1, x%)");
        assert_eq!(call.ty, DataType::Int);
        match call.kind {
            ExprKind::Call(Call { name, args, .. }) => {
                assert_eq!(name, "DoSum");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected a call, got {:?}", other),
        }

        let element = expr("grid#[i%][2]");
        assert_eq!(element.ty, DataType::Float);
        match element.kind {
            ExprKind::ArrayValue(value) => {
                let grid = DataType::array(2, AtomicType::Float).unwrap();
                assert_eq!(value.array_type(), grid);
            }
            other => panic!("expected an element, got {:?}", other),
        }

        let entry = expr("ages$%(\"bob\")");
        assert_eq!(entry.ty, DataType::Int);
        assert!(matches!(entry.kind, ExprKind::DictValue(_)));
    }

    #[test]
    fn whole_containers_are_variables() {
        assert_eq!(tree("grid#[][]"), "Variable grid: array#[][]\n");
        assert_eq!(tree("ages$%()"), "Variable ages: dict$%()\n");
    }

    #[test]
    fn dangling_operator_is_left_unconsumed() {
        let parsed = parse_with("1 +", |p| {
            let parsed = p.parse_expression()?;
            assert!(p.tokens.check(Keyword::Plus));
            p.tokens.forward();
            Ok(parsed)
        })
        .unwrap();
        assert_eq!(parsed, Some(int(1)));
    }

    #[test]
    fn operator_type_errors() {
        let message = |source: &str| {
            let err = parse_with(source, |p| p.parse_expression()).unwrap_err();
            err.message().to_string()
        };
        assert_eq!(message("1 + 1.5"), "Type mismatch: int% and float#");
        assert_eq!(message("\"a\" * 2"), "Type mismatch: string$ and int%");
        assert_eq!(
            message("x! + y!"),
            "Operator '+' cannot be applied to type bool!"
        );
        assert_eq!(message("1 / 0"), "Division by zero");
    }
}
