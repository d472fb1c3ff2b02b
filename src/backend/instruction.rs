use std::fmt;

use super::label::Label;
use crate::types::{AtomicType, DataType};

/// A method reference as written after `call`, `callvirt` and `newobj`:
/// `[instance] <returns> [<owner>::]<name>(<params>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRef {
    pub instance: bool,
    pub returns: String,
    pub owner: Option<String>,
    pub name: String,
    pub params: Vec<String>,
}

impl MethodRef {
    pub fn new(returns: impl Into<String>, name: impl Into<String>) -> Self {
        MethodRef {
            instance: false,
            returns: returns.into(),
            owner: None,
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Instance method of `owner`; the receiver is popped along with the
    /// arguments.
    pub fn instance(
        returns: impl Into<String>,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        MethodRef {
            instance: true,
            owner: Some(owner.into()),
            ..MethodRef::new(returns, name)
        }
    }

    /// Static method of `owner`.
    pub fn on(
        returns: impl Into<String>,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        MethodRef {
            owner: Some(owner.into()),
            ..MethodRef::new(returns, name)
        }
    }

    pub fn constructor(owner: impl Into<String>) -> Self {
        MethodRef::instance("void", owner, ".ctor")
    }

    pub fn with_params<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn returns_value(&self) -> bool {
        self.returns != "void"
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance {
            write!(f, "instance ")?;
        }
        write!(f, "{} ", self.returns)?;
        if let Some(owner) = &self.owner {
            write!(f, "{}::", owner)?;
        }
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

/// A static field of the program module.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub ty: String,
    pub name: String,
}

impl Field {
    pub fn new(ty: &DataType, name: impl Into<String>) -> Self {
        Field {
            ty: ty.il_name(),
            name: name.into(),
        }
    }
}

/// Typed instruction set. Slot operands are already range checked by
/// the emitter, so rendering cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    LdcI4(i32),
    LdcR8(f64),
    Ldstr(String),
    Ldnull,
    Ldarg(u16),
    Starg(u16),
    Ldloc(u16),
    Stloc(u16),
    Ldsfld(Field),
    Stsfld(Field),
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Ceq,
    Cgt,
    Clt,
    Neg,
    ConvI4,
    ConvR8,
    Ldlen,
    Pop,
    Br(Label),
    Brtrue(Label),
    Brfalse(Label),
    Newarr(AtomicType),
    Ldelem(AtomicType),
    Stelem(AtomicType),
    Newobj(MethodRef),
    Call(MethodRef),
    Callvirt(MethodRef),
    Ret,
}

impl Instruction {
    /// `(pops, pushes)`. `ret` is left to the emitter, which knows the
    /// method's return type.
    pub fn stack_effect(&self) -> (usize, usize) {
        use Instruction::*;
        match self {
            LdcI4(_) | LdcR8(_) | Ldstr(_) | Ldnull | Ldarg(_) | Ldloc(_) | Ldsfld(_) => (0, 1),
            Starg(_) | Stloc(_) | Stsfld(_) | Pop | Brtrue(_) | Brfalse(_) => (1, 0),
            Add | Sub | Mul | Div | Rem | And | Or | Ceq | Cgt | Clt => (2, 1),
            Neg | ConvI4 | ConvR8 | Ldlen | Newarr(_) => (1, 1),
            Ldelem(_) => (2, 1),
            Stelem(_) => (3, 0),
            Br(_) | Ret => (0, 0),
            Newobj(ctor) => (ctor.params.len(), 1),
            Call(method) | Callvirt(method) => (
                method.params.len() + method.instance as usize,
                method.returns_value() as usize,
            ),
        }
    }

    /// The label this instruction may jump to.
    pub fn target(&self) -> Option<Label> {
        match self {
            Instruction::Br(label) | Instruction::Brtrue(label) | Instruction::Brfalse(label) => {
                Some(*label)
            }
            _ => None,
        }
    }
}

/// `name.0`..`name.3`, `name.s n` up to 255, `name n` above.
fn indexed(f: &mut fmt::Formatter<'_>, name: &str, index: u16) -> fmt::Result {
    match index {
        0..=3 => write!(f, "{}.{}", name, index),
        4..=255 => write!(f, "{}.s {}", name, index),
        _ => write!(f, "{} {}", name, index),
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match self {
            LdcI4(-1) => write!(f, "ldc.i4.m1"),
            LdcI4(n @ 0..=8) => write!(f, "ldc.i4.{}", n),
            LdcI4(n @ -128..=127) => write!(f, "ldc.i4.s {}", n),
            LdcI4(n) => write!(f, "ldc.i4 {}", n),
            LdcR8(n) => write!(f, "ldc.r8 {:?}", n),
            Ldstr(text) => write!(f, "ldstr \"{}\"", escape(text)),
            Ldnull => write!(f, "ldnull"),
            Ldarg(index) => indexed(f, "ldarg", *index),
            Starg(index) if *index <= 255 => write!(f, "starg.s {}", index),
            Starg(index) => write!(f, "starg {}", index),
            Ldloc(index) => indexed(f, "ldloc", *index),
            Stloc(index) => indexed(f, "stloc", *index),
            Ldsfld(field) => write!(f, "ldsfld {} {}", field.ty, field.name),
            Stsfld(field) => write!(f, "stsfld {} {}", field.ty, field.name),
            Add => write!(f, "add"),
            Sub => write!(f, "sub"),
            Mul => write!(f, "mul"),
            Div => write!(f, "div"),
            Rem => write!(f, "rem"),
            And => write!(f, "and"),
            Or => write!(f, "or"),
            Ceq => write!(f, "ceq"),
            Cgt => write!(f, "cgt"),
            Clt => write!(f, "clt"),
            Neg => write!(f, "neg"),
            ConvI4 => write!(f, "conv.i4"),
            ConvR8 => write!(f, "conv.r8"),
            Ldlen => write!(f, "ldlen"),
            Pop => write!(f, "pop"),
            Br(label) => write!(f, "br {}", label),
            Brtrue(label) => write!(f, "brtrue {}", label),
            Brfalse(label) => write!(f, "brfalse {}", label),
            Newarr(element) => write!(f, "newarr {}", element.runtime_class()),
            Ldelem(element) => write!(f, "ldelem.{}", element.element_suffix()),
            Stelem(element) => write!(f, "stelem.{}", element.element_suffix()),
            Newobj(ctor) => write!(f, "newobj {}", ctor),
            Call(method) => write!(f, "call {}", method),
            Callvirt(method) => write!(f, "callvirt {}", method),
            Ret => write!(f, "ret"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_forms_of_integer_loads() {
        let rendered: Vec<String> = [-1, 0, 8, 9, -128, 127, 128, -129, 100000]
            .iter()
            .map(|n| Instruction::LdcI4(*n).to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "ldc.i4.m1",
                "ldc.i4.0",
                "ldc.i4.8",
                "ldc.i4.s 9",
                "ldc.i4.s -128",
                "ldc.i4.s 127",
                "ldc.i4 128",
                "ldc.i4 -129",
                "ldc.i4 100000"
            ]
        );
    }

    #[test]
    fn indexed_forms() {
        assert_eq!(Instruction::Ldarg(3).to_string(), "ldarg.3");
        assert_eq!(Instruction::Ldloc(4).to_string(), "ldloc.s 4");
        assert_eq!(Instruction::Stloc(255).to_string(), "stloc.s 255");
        assert_eq!(Instruction::Stloc(256).to_string(), "stloc 256");
        assert_eq!(Instruction::Starg(0).to_string(), "starg.s 0");
        assert_eq!(Instruction::Starg(300).to_string(), "starg 300");
    }

    #[test]
    fn method_references() {
        let concat = MethodRef::on("string", "[mscorlib]System.String", "Concat")
            .with_params(["string", "string"]);
        assert_eq!(
            Instruction::Call(concat.clone()).to_string(),
            "call string [mscorlib]System.String::Concat(string, string)"
        );
        assert_eq!(Instruction::Call(concat).stack_effect(), (2, 1));

        let length = MethodRef::instance("int32", "[mscorlib]System.String", "get_Length");
        assert_eq!(
            Instruction::Callvirt(length.clone()).to_string(),
            "callvirt instance int32 [mscorlib]System.String::get_Length()"
        );
        assert_eq!(Instruction::Callvirt(length).stack_effect(), (1, 1));

        let ctor = MethodRef::constructor("int32[0...,0...]").with_params(["int32", "int32"]);
        assert_eq!(
            Instruction::Newobj(ctor.clone()).to_string(),
            "newobj instance void int32[0...,0...]::.ctor(int32, int32)"
        );
        assert_eq!(Instruction::Newobj(ctor).stack_effect(), (2, 1));

        let user = MethodRef::new("void", "PrintSum").with_params(["int32"]);
        assert_eq!(
            Instruction::Call(user).to_string(),
            "call void PrintSum(int32)"
        );
    }

    #[test]
    fn arrays_and_literals() {
        assert_eq!(
            Instruction::Newarr(AtomicType::Float).to_string(),
            "newarr [mscorlib]System.Double"
        );
        assert_eq!(
            Instruction::Ldelem(AtomicType::Str).to_string(),
            "ldelem.ref"
        );
        assert_eq!(
            Instruction::Stelem(AtomicType::Bool).to_string(),
            "stelem.i1"
        );
        assert_eq!(Instruction::LdcR8(1.0).to_string(), "ldc.r8 1.0");
        assert_eq!(
            Instruction::Ldstr("a\\b".into()).to_string(),
            "ldstr \"a\\\\b\""
        );
        assert_eq!(
            Instruction::Ldsfld(Field::new(&DataType::Int, "count")).to_string(),
            "ldsfld int32 count"
        );
    }
}
