use super::Codegen;
use crate::ast::{Call, Expr};
use crate::backend::instruction::Instruction;
use crate::compiler::Inline;
use crate::error::CompilerError;
use crate::types::DataType;

fn check_arity(name: &str, expected: usize, args: &[Expr]) -> Result<(), CompilerError> {
    if args.len() != expected {
        return Err(CompilerError::semantic(format!(
            "Function '{}' expects {} argument(s), got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

impl Codegen<'_> {
    /// Errors that do not point elsewhere point at the callee name.
    pub(super) fn compile_call(&mut self, call: &Call) -> Result<(), CompilerError> {
        self.emit_call(call).map_err(|err| err.at(&call.position))
    }

    fn emit_call(&mut self, call: &Call) -> Result<(), CompilerError> {
        if let Some(inline) = Inline::from_name(&call.name) {
            return self.compile_inline(inline, call);
        }

        let compiler = self.compiler;
        let callee = compiler.function(&call.name).ok_or_else(|| {
            CompilerError::semantic(format!("Undefined function '{}'", call.name))
        })?;
        check_arity(&call.name, callee.args().len(), &call.args)?;
        for (index, (param, arg)) in callee.args().iter().zip(&call.args).enumerate() {
            if param.ty != arg.ty {
                return Err(CompilerError::semantic(format!(
                    "Argument {} of function '{}' must be {}, not {}",
                    index + 1,
                    call.name,
                    param.ty,
                    arg.ty
                )));
            }
        }
        let returns = callee.return_type();
        check_call_site(&call.name, returns, call.return_type)?;

        for arg in &call.args {
            self.compile_expr(arg)?;
        }
        self.emit(Instruction::Call(callee.signature()))?;
        self.discard_unused(returns, call.return_type)
    }

    fn compile_inline(&mut self, inline: Inline, call: &Call) -> Result<(), CompilerError> {
        check_arity(inline.name(), 1, &call.args)?;
        let arg = &call.args[0];
        let expansion = inline.expansion(&arg.ty).ok_or_else(|| {
            CompilerError::semantic(format!(
                "Function '{}' cannot be applied to {}",
                inline.name(),
                arg.ty
            ))
        })?;
        check_call_site(inline.name(), inline.return_type(), call.return_type)?;

        self.compile_expr(arg)?;
        self.emit_all(expansion)?;
        self.discard_unused(inline.return_type(), call.return_type)
    }

    /// A value-returning function called as a statement leaves nothing
    /// behind.
    fn discard_unused(
        &mut self,
        returns: DataType,
        requested: DataType,
    ) -> Result<(), CompilerError> {
        if requested.is_void() && !returns.is_void() {
            self.emit(Instruction::Pop)?;
        }
        Ok(())
    }
}

/// The type a call is written with must be the callee's, except that any
/// result may be discarded by calling it as `void`.
fn check_call_site(
    name: &str,
    returns: DataType,
    requested: DataType,
) -> Result<(), CompilerError> {
    if requested == returns || requested.is_void() {
        return Ok(());
    }
    Err(CompilerError::semantic(format!(
        "Function '{}' returns {}, not {}",
        name, returns, requested
    )))
}
