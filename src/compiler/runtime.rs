use crate::backend::{Instruction, Method, MethodRef};
use crate::error::CompilerError;
use crate::symbols::{SymbolTable, Variable};
use crate::types::DataType;

/// Framework method a runtime function forwards its arguments to.
pub struct Extern {
    /// `callvirt` on the first argument instead of a static `call`.
    pub virtual_call: bool,
    pub returns: &'static str,
    pub owner: &'static str,
    pub name: &'static str,
    pub params: &'static [&'static str],
}

pub enum Body {
    Forward(Extern),
    Raw(&'static [&'static str]),
}

/// Declarative runtime library. Entries are emitted first, in this order.
pub struct RuntimeDef {
    pub name: &'static str,
    pub returns: DataType,
    pub params: &'static [(&'static str, DataType)],
    pub body: Body,
}

pub const RUNTIME_FUNCTIONS: &[RuntimeDef] = &[
    RuntimeDef {
        name: "print",
        returns: DataType::Void,
        params: &[("text", DataType::Str)],
        body: Body::Forward(Extern {
            virtual_call: false,
            returns: "void",
            owner: "[mscorlib]System.Console",
            name: "Write",
            params: &["string"],
        }),
    },
    RuntimeDef {
        name: "printn",
        returns: DataType::Void,
        params: &[("text", DataType::Str)],
        body: Body::Forward(Extern {
            virtual_call: false,
            returns: "void",
            owner: "[mscorlib]System.Console",
            name: "WriteLine",
            params: &["string"],
        }),
    },
    RuntimeDef {
        name: "read",
        returns: DataType::Str,
        params: &[],
        body: Body::Forward(Extern {
            virtual_call: false,
            returns: "string",
            owner: "[mscorlib]System.Console",
            name: "ReadLine",
            params: &[],
        }),
    },
    RuntimeDef {
        name: "random",
        returns: DataType::Int,
        params: &[("from", DataType::Int), ("to", DataType::Int)],
        body: Body::Raw(&[
            ".maxstack 3",
            "ldsfld class [mscorlib]System.Random __RNG",
            "ldarg.0",
            "ldarg.1",
            "callvirt instance int32 [mscorlib]System.Random::Next(int32, int32)",
            "ret",
        ]),
    },
    RuntimeDef {
        name: "substr",
        returns: DataType::Str,
        params: &[
            ("str", DataType::Str),
            ("start", DataType::Int),
            ("length", DataType::Int),
        ],
        body: Body::Forward(Extern {
            virtual_call: true,
            returns: "string",
            owner: "[mscorlib]System.String",
            name: "Substring",
            params: &["int32", "int32"],
        }),
    },
    RuntimeDef {
        name: "strlen",
        returns: DataType::Int,
        params: &[("str", DataType::Str)],
        body: Body::Forward(Extern {
            virtual_call: true,
            returns: "int32",
            owner: "[mscorlib]System.String",
            name: "get_Length",
            params: &[],
        }),
    },
];

pub fn is_runtime_function(name: &str) -> bool {
    RUNTIME_FUNCTIONS.iter().any(|def| def.name == name)
}

impl Extern {
    fn method_ref(&self) -> MethodRef {
        let method = if self.virtual_call {
            MethodRef::instance(self.returns, self.owner, self.name)
        } else {
            MethodRef::on(self.returns, self.owner, self.name)
        };
        method.with_params(self.params.iter().copied())
    }
}

impl RuntimeDef {
    pub fn build(&self) -> Result<Method, CompilerError> {
        let mut args = SymbolTable::new();
        for (name, ty) in self.params {
            args.define(Variable::new(*name, *ty))?;
        }

        let forward = match &self.body {
            Body::Raw(lines) => return Ok(Method::raw(self.name, self.returns, args, lines)),
            Body::Forward(forward) => forward,
        };

        let mut method = Method::new(self.name, self.returns, args);
        for index in 0..self.params.len() {
            method.emit(Instruction::Ldarg(Method::slot(index)?))?;
        }
        let target = forward.method_ref();
        method.emit(if forward.virtual_call {
            Instruction::Callvirt(target)
        } else {
            Instruction::Call(target)
        })?;
        method.emit(Instruction::Ret)?;
        Ok(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(name: &str) -> String {
        RUNTIME_FUNCTIONS
            .iter()
            .find(|def| def.name == name)
            .unwrap()
            .build()
            .unwrap()
            .code()
            .unwrap()
    }

    #[test]
    fn forwarding_functions() {
        assert_eq!(
            code("print"),
            ".method public static void print(string) cil managed\n{\n.maxstack 1\nldarg.0\ncall void [mscorlib]System.Console::Write(string)\nret\n}\n"
        );
        assert!(code("read").contains(
            ".maxstack 1\ncall string [mscorlib]System.Console::ReadLine()\nret\n"
        ));
        assert!(code("substr").contains(
            ".maxstack 3\nldarg.0\nldarg.1\nldarg.2\ncallvirt instance string [mscorlib]System.String::Substring(int32, int32)\nret\n"
        ));
        assert!(code("strlen").contains(
            "callvirt instance int32 [mscorlib]System.String::get_Length()"
        ));
    }

    #[test]
    fn random_is_raw() {
        assert_eq!(
            code("random"),
            ".method public static int32 random(int32, int32) cil managed\n{\n.maxstack 3\nldsfld class [mscorlib]System.Random __RNG\nldarg.0\nldarg.1\ncallvirt instance int32 [mscorlib]System.Random::Next(int32, int32)\nret\n}\n"
        );
    }

    #[test]
    fn names() {
        assert!(is_runtime_function("printn"));
        assert!(!is_runtime_function("main"));
    }
}
