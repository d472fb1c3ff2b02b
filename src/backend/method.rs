use std::fmt::Write;

use super::instruction::{Instruction, MethodRef};
use super::label::Label;
use crate::error::CompilerError;
use crate::symbols::{Symbol, SymbolTable, Variable};
use crate::types::DataType;

pub const ENTRY_POINT: &str = "main";

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Instruction(Instruction),
    Label(Label),
    Raw(String),
}

/// One method of the output program. Every instruction goes through
/// `emit`, which keeps the operand stack depth and its maximum.
#[derive(Debug, Clone)]
pub struct Method {
    name: String,
    return_type: DataType,
    args: SymbolTable<Variable>,
    locals: SymbolTable<Variable>,
    code: Vec<Line>,
    depth: usize,
    max_depth: usize,
    raw: bool,
    /// Emitted flag per label, indexed by label number.
    labels: Vec<bool>,
}

impl Symbol for Method {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Method {
    pub fn new(
        name: impl Into<String>,
        return_type: DataType,
        args: SymbolTable<Variable>,
    ) -> Self {
        Method {
            name: name.into(),
            return_type,
            args,
            locals: SymbolTable::new(),
            code: Vec::new(),
            depth: 0,
            max_depth: 0,
            raw: false,
            labels: Vec::new(),
        }
    }

    /// A method whose body is printed exactly as given, header directives
    /// included.
    pub fn raw(
        name: impl Into<String>,
        return_type: DataType,
        args: SymbolTable<Variable>,
        body: &[&str],
    ) -> Self {
        let mut method = Method::new(name, return_type, args);
        method.raw = true;
        method.code = body.iter().map(|&line| Line::Raw(line.into())).collect();
        method
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> DataType {
        self.return_type
    }

    pub fn args(&self) -> &SymbolTable<Variable> {
        &self.args
    }

    pub fn locals(&self) -> &SymbolTable<Variable> {
        &self.locals
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_entry_point(&self) -> bool {
        self.name == ENTRY_POINT
    }

    /// How callers refer to this method.
    pub fn signature(&self) -> MethodRef {
        MethodRef::new(self.return_type.il_name(), self.name.clone())
            .with_params(self.args.iter().map(|arg| arg.ty.il_name()))
    }

    pub fn declare_local(&mut self, local: Variable) -> Result<usize, CompilerError> {
        self.locals.define(local)
    }

    pub fn emit(&mut self, instruction: Instruction) -> Result<(), CompilerError> {
        if let Some(label) = instruction.target() {
            self.check_label(label)?;
        }

        let (pops, pushes) = match instruction {
            Instruction::Ret => (usize::from(!self.return_type.is_void()), 0),
            _ => instruction.stack_effect(),
        };
        self.depth = self.depth.checked_sub(pops).ok_or_else(|| {
            CompilerError::internal(format!(
                "Stack integrity check failed in function '{}': pop from empty stack at '{}'",
                self.name, instruction
            ))
        })?;
        self.depth += pushes;
        self.max_depth = self.max_depth.max(self.depth);

        if instruction == Instruction::Ret {
            self.check_stack_is_empty()?;
        }
        self.code.push(Line::Instruction(instruction));
        Ok(())
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(false);
        Label(self.labels.len() - 1)
    }

    /// Places `label` at the current position.
    pub fn mark(&mut self, label: Label) -> Result<(), CompilerError> {
        self.check_label(label)?;
        let emitted = &mut self.labels[label.index()];
        if *emitted {
            return Err(CompilerError::internal(format!(
                "Label {} emitted twice in function '{}'",
                label, self.name
            )));
        }
        *emitted = true;
        self.code.push(Line::Label(label));
        Ok(())
    }

    fn check_label(&self, label: Label) -> Result<(), CompilerError> {
        if label.index() < self.labels.len() {
            Ok(())
        } else {
            Err(CompilerError::internal(format!(
                "Label {} does not belong to function '{}'",
                label, self.name
            )))
        }
    }

    fn check_stack_is_empty(&self) -> Result<(), CompilerError> {
        if self.depth == 0 {
            Ok(())
        } else {
            Err(CompilerError::internal(format!(
                "Stack integrity check failed in function '{}': {} values left on the stack",
                self.name, self.depth
            )))
        }
    }

    /// Argument or local slot number in the range the instruction set
    /// can address.
    pub fn slot(index: usize) -> Result<u16, CompilerError> {
        u16::try_from(index)
            .map_err(|_| CompilerError::internal(format!("Slot index {} is out of range", index)))
    }

    /// The method as IL text.
    pub fn code(&self) -> Result<String, CompilerError> {
        self.check_stack_is_empty()?;
        if let Some(index) = self.labels.iter().position(|emitted| !emitted) {
            return Err(CompilerError::internal(format!(
                "Label {} was never emitted in function '{}'",
                Label(index),
                self.name
            )));
        }

        let mut text = String::new();
        let args: Vec<String> = self.args.iter().map(|arg| arg.ty.il_name()).collect();
        // Writing into a String cannot fail.
        let _ = writeln!(
            text,
            ".method public static {} {}({}) cil managed",
            self.return_type.il_name(),
            self.name,
            args.join(", ")
        );
        text.push_str("{\n");

        if !self.raw {
            if !self.locals.is_empty() {
                let locals: Vec<String> = self
                    .locals
                    .iter()
                    .map(|local| local.ty.il_name())
                    .collect();
                let _ = writeln!(text, ".locals init ({})", locals.join(", "));
            }

            let max_stack = if self.is_entry_point() {
                self.max_depth.max(1)
            } else {
                self.max_depth
            };
            let _ = writeln!(text, ".maxstack {}", max_stack);

            if self.is_entry_point() {
                text.push_str(".entrypoint\n");
                text.push_str("newobj instance void [mscorlib]System.Random::.ctor()\n");
                text.push_str("stsfld class [mscorlib]System.Random __RNG\n");
            }
        }

        for line in &self.code {
            let _ = match line {
                Line::Instruction(instruction) => writeln!(text, "{}", instruction),
                Line::Label(label) => writeln!(text, "{}:", label),
                Line::Raw(raw) => writeln!(text, "{}", raw),
            };
        }
        text.push_str("}\n");
        Ok(text)
    }
}
