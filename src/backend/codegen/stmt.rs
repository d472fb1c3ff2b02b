use tracing::warn;

use super::Codegen;
use crate::ast::{Assign, ConstValue, Expr, ExprKind, Stmt};
use crate::backend::instruction::{Instruction, MethodRef};
use crate::backend::label::Label;
use crate::error::CompilerError;
use crate::frontend::Position;
use crate::types::DataType;

/// Sign of a loop step known at compile time.
fn constant_step(step: &Expr) -> Option<f64> {
    match &step.kind {
        ExprKind::Constant(ConstValue::Int(n)) => Some(f64::from(*n)),
        ExprKind::Constant(ConstValue::Float(n)) => Some(*n),
        _ => None,
    }
}

impl Codegen<'_> {
    /// Returns whether the block ends in `return`. Statements after a
    /// `return` are dropped.
    pub(super) fn compile_block(&mut self, block: &[Stmt]) -> Result<bool, CompilerError> {
        for (index, stmt) in block.iter().enumerate() {
            if self.compile_stmt(stmt)? {
                let dropped = block.len() - index - 1;
                if dropped > 0 {
                    warn!(
                        function = %self.method.name(),
                        statements = dropped,
                        "unreachable code after return"
                    );
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<bool, CompilerError> {
        match stmt {
            Stmt::Assign(assign) => self.compile_assign(assign)?,
            Stmt::ArrayAssign { target, value } => {
                self.push_array(target)?;
                self.compile_expr(value)?;
                self.emit_store_element(target)?;
            }
            Stmt::DictAssign { target, value } => {
                let dict = self.push_dict(target)?;
                self.compile_expr(value)?;
                let set = MethodRef::instance("void", dict.il_name(), "set_Item")
                    .with_params(["!0", "!1"]);
                self.emit(Instruction::Callvirt(set))?;
            }
            Stmt::Return { value, position } => {
                self.compile_return(value.as_ref(), position)?;
                return Ok(true);
            }
            Stmt::If {
                condition,
                consequent,
                alternative,
            } => return self.compile_if(condition, consequent, alternative.as_deref()),
            Stmt::While {
                condition,
                body,
                do_while: false,
            } => self.compile_while(condition, body)?,
            Stmt::While {
                condition,
                body,
                do_while: true,
            } => self.compile_do_while(condition, body)?,
            Stmt::For {
                from,
                to,
                step,
                body,
                position,
            } => self.compile_for(from, to, step, body, position)?,
            Stmt::Call(call) => self.compile_call(call)?,
        }
        Ok(false)
    }

    fn compile_assign(&mut self, assign: &Assign) -> Result<(), CompilerError> {
        self.compile_expr(&assign.value)?;
        self.store_variable(&assign.target, &assign.position)
    }

    fn compile_return(
        &mut self,
        value: Option<&Expr>,
        position: &Position,
    ) -> Result<(), CompilerError> {
        let expected = self.method.return_type();
        let actual = value.map_or(DataType::Void, |value| value.ty);
        if actual != expected {
            let err = CompilerError::semantic(format!(
                "Function '{}' must return {}, not {}",
                self.method.name(),
                expected,
                actual
            ));
            return Err(err.at(position));
        }
        if let Some(value) = value {
            self.compile_expr(value)?;
        }
        self.emit(Instruction::Ret)
    }

    fn compile_if(
        &mut self,
        condition: &Expr,
        consequent: &[Stmt],
        alternative: Option<&[Stmt]>,
    ) -> Result<bool, CompilerError> {
        let otherwise = self.method.new_label();
        self.compile_expr(condition)?;
        self.emit(Instruction::Brfalse(otherwise))?;
        let consequent_returns = self.compile_block(consequent)?;

        let alternative = match alternative {
            Some(alternative) => alternative,
            None => {
                self.method.mark(otherwise)?;
                return Ok(false);
            }
        };

        if consequent_returns {
            self.method.mark(otherwise)?;
            return self.compile_block(alternative);
        }
        let end = self.method.new_label();
        self.emit(Instruction::Br(end))?;
        self.method.mark(otherwise)?;
        self.compile_block(alternative)?;
        self.method.mark(end)?;
        Ok(false)
    }

    fn compile_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<(), CompilerError> {
        let start = self.method.new_label();
        let end = self.method.new_label();
        self.method.mark(start)?;
        self.compile_expr(condition)?;
        self.emit(Instruction::Brfalse(end))?;
        self.compile_block(body)?;
        self.emit(Instruction::Br(start))?;
        self.method.mark(end)
    }

    fn compile_do_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<(), CompilerError> {
        let start = self.method.new_label();
        self.method.mark(start)?;
        self.compile_block(body)?;
        self.compile_expr(condition)?;
        self.emit(Instruction::Brtrue(start))
    }

    /// `to` and `step` are evaluated on every pass.
    fn compile_for(
        &mut self,
        from: &Assign,
        to: &Expr,
        step: &Expr,
        body: &[Stmt],
        position: &Position,
    ) -> Result<(), CompilerError> {
        let counter = from.target_expr();
        let known_step = constant_step(step);
        if known_step == Some(0.0) {
            let err = CompilerError::semantic("FOR loop step cannot be zero");
            return Err(err.at(position));
        }

        self.compile_assign(from)?;
        let start = self.method.new_label();
        let end = self.method.new_label();
        self.method.mark(start)?;

        match known_step {
            Some(n) => self.emit_loop_exit(&counter, to, n > 0.0, end)?,
            None => {
                let descending = self.method.new_label();
                let run = self.method.new_label();
                self.compile_expr(step)?;
                self.load_zero(from.target.ty)?;
                self.emit(Instruction::Clt)?;
                self.emit(Instruction::Brtrue(descending))?;
                self.emit_loop_exit(&counter, to, true, end)?;
                self.emit(Instruction::Br(run))?;
                self.method.mark(descending)?;
                self.emit_loop_exit(&counter, to, false, end)?;
                self.method.mark(run)?;
            }
        }

        self.compile_block(body)?;
        self.compile_expr(&counter)?;
        self.compile_expr(step)?;
        self.emit(Instruction::Add)?;
        self.store_variable(&from.target, &from.position)?;
        self.emit(Instruction::Br(start))?;
        self.method.mark(end)
    }

    /// Jumps to `end` once the counter has passed `to`.
    fn emit_loop_exit(
        &mut self,
        counter: &Expr,
        to: &Expr,
        ascending: bool,
        end: Label,
    ) -> Result<(), CompilerError> {
        self.compile_expr(counter)?;
        self.compile_expr(to)?;
        self.emit(if ascending {
            Instruction::Cgt
        } else {
            Instruction::Clt
        })?;
        self.emit(Instruction::Brtrue(end))
    }

    fn load_zero(&mut self, ty: DataType) -> Result<(), CompilerError> {
        self.emit(match ty {
            DataType::Float => Instruction::LdcR8(0.0),
            _ => Instruction::LdcI4(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body, method_code};

    #[test]
    fn if_else_chain() {
        let code = body(
            "def f%(x%) { if x% > 0 { return 1 } else if x% < 0 { return ~1 }\nreturn 0 }",
            "f",
        );
        assert_eq!(
            code,
            "ldarg.0\nldc.i4.0\ncgt\nbrfalse L_0\nldc.i4.1\nret\nL_0:\n\
             ldarg.0\nldc.i4.0\nclt\nbrfalse L_1\nldc.i4.m1\nret\nL_1:\n\
             ldc.i4.0\nret\n"
        );
    }

    #[test]
    fn if_with_both_branches_falling_through() {
        let code = body("def f(x!) { if x! { y% = 1 } else { y% = 2 } }", "f");
        assert_eq!(
            code,
            "ldarg.0\nbrfalse L_0\nldc.i4.1\nstloc.0\nbr L_1\nL_0:\nldc.i4.2\nstloc.0\nL_1:\nret\n"
        );
    }

    #[test]
    fn both_branches_returning_skip_the_epilogue() {
        let code = body("def f%(x!) { if x! { return 1 } else { return 2 } }", "f");
        assert_eq!(
            code,
            "ldarg.0\nbrfalse L_0\nldc.i4.1\nret\nL_0:\nldc.i4.2\nret\n"
        );
    }

    #[test]
    fn while_and_do_while() {
        let code = body("def f(n%) { while n% > 0 { n% = n% - 1 } }", "f");
        assert_eq!(
            code,
            "L_0:\nldarg.0\nldc.i4.0\ncgt\nbrfalse L_1\n\
             ldarg.0\nldc.i4.1\nsub\nstarg.s 0\nbr L_0\nL_1:\nret\n"
        );
        let code = body("def f(n%) { do { n% = n% - 1 } while n% > 0 }", "f");
        assert_eq!(
            code,
            "L_0:\nldarg.0\nldc.i4.1\nsub\nstarg.s 0\nldarg.0\nldc.i4.0\ncgt\nbrtrue L_0\nret\n"
        );
    }

    #[test]
    fn for_with_constant_steps() {
        let code = body("def f() { for i% = 1 to 10 { } }", "f");
        assert_eq!(
            code,
            "ldc.i4.1\nstloc.0\nL_0:\nldloc.0\nldc.i4.s 10\ncgt\nbrtrue L_1\n\
             ldloc.0\nldc.i4.1\nadd\nstloc.0\nbr L_0\nL_1:\nret\n"
        );
        let code = body("def f() { for i% = 10 to 1 step ~2 { } }", "f");
        assert!(code.contains("ldloc.0\nldc.i4.1\nclt\nbrtrue L_1\n"));

        let err = method_code("def f() {\n  for i% = 1 to 10 step 0 { }\n}", "f").unwrap_err();
        assert_eq!(err.message(), "FOR loop step cannot be zero");
        let position = err.position().unwrap();
        assert_eq!((position.line, position.column), (2, 2));
    }

    #[test]
    fn for_with_a_runtime_step_checks_its_sign() {
        let code = body("def f(s#) { for x# = 0.0 to 1.0 step s# { } }", "f");
        assert!(code.starts_with(
            "ldc.r8 0.0\nstloc.0\nL_0:\nldarg.0\nldc.r8 0.0\nclt\nbrtrue L_2\n\
             ldloc.0\nldc.r8 1.0\ncgt\nbrtrue L_1\nbr L_3\nL_2:\n\
             ldloc.0\nldc.r8 1.0\nclt\nbrtrue L_1\nL_3:\n"
        ));
    }

    #[test]
    fn element_stores() {
        let code = body("def f(xs$[], d%#()) { xs$[0] = \"a\"\nd%#(1) = 2.5 }", "f");
        assert_eq!(
            code,
            "ldarg.0\nldc.i4.0\nldstr \"a\"\nstelem.ref\n\
             ldarg.1\nldc.i4.1\nldc.r8 2.5\n\
             callvirt instance void class \
             [mscorlib]System.Collections.Generic.Dictionary`2<int32,float64>::set_Item(!0, !1)\n\
             ret\n"
        );
        let code = body("def f(g![][]) { g![1][2] = true! }", "f");
        assert!(code.contains(
            "call instance void bool[0...,0...]::Set(int32, int32, bool)"
        ));
    }

    #[test]
    fn return_type_is_checked() {
        let err = method_code("def f%() { return \"x\" }", "f").unwrap_err();
        assert_eq!(err.message(), "Function 'f' must return int%, not string$");
        let err = method_code("def f%() {\n  return\n}", "f").unwrap_err();
        assert_eq!(err.message(), "Function 'f' must return int%, not void");
        assert_eq!(err.position().map(|p| (p.line, p.column)), Some((2, 2)));
    }

    #[test]
    fn statements_after_return_are_dropped() {
        assert_eq!(
            body("def f%() { return 1\nx% = 2 }", "f"),
            "ldc.i4.1\nret\n"
        );
    }
}
