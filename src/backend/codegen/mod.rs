mod call;
mod expr;
mod stmt;

use tracing::debug;

use super::instruction::{Field, Instruction};
use super::method::Method;
use crate::ast::{ConstValue, Function};
use crate::compiler::Compiler;
use crate::error::CompilerError;
use crate::frontend::Position;
use crate::symbols::Variable;
use crate::types::DataType;

/// Generates the body of one user function. Globals, constants and the
/// signatures of every function come from the compiler context; locals
/// are declared on first assignment.
pub struct Codegen<'a> {
    compiler: &'a Compiler,
    method: Method,
}

/// What a name refers to inside the function being compiled.
enum Binding<'a> {
    Arg(u16, DataType),
    Local(u16, DataType),
    Global(DataType),
    Constant(&'a ConstValue),
}

impl Binding<'_> {
    fn ty(&self) -> DataType {
        match self {
            Binding::Arg(_, ty) | Binding::Local(_, ty) | Binding::Global(ty) => *ty,
            Binding::Constant(value) => value.ty(),
        }
    }
}

impl<'a> Codegen<'a> {
    /// Starts from the declaration `name` already has in `compiler`.
    pub fn new(compiler: &'a Compiler, name: &str) -> Result<Self, CompilerError> {
        let method = compiler.function(name).cloned().ok_or_else(|| {
            CompilerError::internal(format!("Function '{}' was never declared", name))
        })?;
        Ok(Codegen { compiler, method })
    }

    pub fn compile_function(mut self, function: &Function) -> Result<Method, CompilerError> {
        let returned = self.compile_block(&function.body)?;
        if !returned {
            self.emit_default_return()?;
        }
        debug!(
            function = %function.name,
            locals = self.method.locals().len(),
            max_stack = self.method.max_depth(),
            "compiled function"
        );
        Ok(self.method)
    }

    fn emit(&mut self, instruction: Instruction) -> Result<(), CompilerError> {
        self.method.emit(instruction)
    }

    fn emit_all(
        &mut self,
        code: impl IntoIterator<Item = Instruction>,
    ) -> Result<(), CompilerError> {
        for instruction in code {
            self.emit(instruction)?;
        }
        Ok(())
    }

    /// Arguments, then locals, then globals, then constants.
    fn resolve(&self, name: &str) -> Result<Option<Binding<'a>>, CompilerError> {
        if let Some((index, arg)) = self.method.args().get_full(name) {
            return Ok(Some(Binding::Arg(Method::slot(index)?, arg.ty)));
        }
        if let Some((index, local)) = self.method.locals().get_full(name) {
            return Ok(Some(Binding::Local(Method::slot(index)?, local.ty)));
        }
        let compiler = self.compiler;
        if let Some(global) = compiler.globals().lookup(name) {
            return Ok(Some(Binding::Global(global.ty)));
        }
        Ok(compiler
            .constants()
            .lookup(name)
            .map(|constant| Binding::Constant(&constant.value)))
    }

    fn check_use(name: &str, binding: &Binding, used_as: DataType) -> Result<(), CompilerError> {
        let declared = binding.ty();
        if declared != used_as {
            return Err(CompilerError::semantic(format!(
                "Variable '{}' is declared as {}, used as {}",
                name, declared, used_as
            )));
        }
        Ok(())
    }

    /// The binding of a name read as `ty`.
    fn lookup(&self, name: &str, ty: DataType) -> Result<Binding<'a>, CompilerError> {
        let binding = self.resolve(name)?.ok_or_else(|| {
            CompilerError::semantic(format!("Undefined variable '{}'", name))
        })?;
        Self::check_use(name, &binding, ty)?;
        Ok(binding)
    }

    fn load_variable(
        &mut self,
        name: &str,
        ty: DataType,
        position: &Position,
    ) -> Result<(), CompilerError> {
        let binding = self.lookup(name, ty).map_err(|err| err.at(position))?;
        match binding {
            Binding::Arg(slot, _) => self.emit(Instruction::Ldarg(slot)),
            Binding::Local(slot, _) => self.emit(Instruction::Ldloc(slot)),
            Binding::Global(ty) => self.emit(Instruction::Ldsfld(Field::new(&ty, name))),
            Binding::Constant(value) => self.load_constant(value),
        }
    }

    /// Pops the stack top into `target`, declaring a local if the name is
    /// new.
    fn store_variable(
        &mut self,
        target: &Variable,
        position: &Position,
    ) -> Result<(), CompilerError> {
        let binding = self.store_binding(target).map_err(|err| err.at(position))?;
        match binding {
            Binding::Arg(slot, _) => self.emit(Instruction::Starg(slot)),
            Binding::Local(slot, _) => self.emit(Instruction::Stloc(slot)),
            Binding::Global(ty) => self.emit(Instruction::Stsfld(Field::new(&ty, &target.name))),
            Binding::Constant(_) => Ok(()),
        }
    }

    fn store_binding(&mut self, target: &Variable) -> Result<Binding<'a>, CompilerError> {
        let binding = match self.resolve(&target.name)? {
            Some(binding) => binding,
            None => {
                let index = self.method.declare_local(target.clone())?;
                Binding::Local(Method::slot(index)?, target.ty)
            }
        };
        if let Binding::Constant(_) = binding {
            return Err(CompilerError::semantic(format!(
                "Cannot assign to constant '{}'",
                target.name
            )));
        }
        Self::check_use(&target.name, &binding, target.ty)?;
        Ok(binding)
    }

    fn load_constant(&mut self, value: &ConstValue) -> Result<(), CompilerError> {
        self.emit(match value {
            ConstValue::Int(n) => Instruction::LdcI4(*n),
            ConstValue::Float(n) => Instruction::LdcR8(*n),
            ConstValue::Str(s) => Instruction::Ldstr(s.clone()),
            ConstValue::Bool(b) => Instruction::LdcI4(i32::from(*b)),
        })
    }

    /// `ret` for a body that does not end in `return`.
    fn emit_default_return(&mut self) -> Result<(), CompilerError> {
        let default = match self.method.return_type() {
            DataType::Void => None,
            DataType::Bool | DataType::Int => Some(Instruction::LdcI4(0)),
            DataType::Float => Some(Instruction::LdcR8(0.0)),
            DataType::Str => Some(Instruction::Ldstr(String::new())),
            DataType::Array { .. } | DataType::Dict { .. } => Some(Instruction::Ldnull),
        };
        if let Some(default) = default {
            self.emit(default)?;
        }
        self.emit(Instruction::Ret)
    }
}
