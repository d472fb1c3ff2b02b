use crate::backend::{Instruction, MethodRef};
use crate::types::{AtomicType, DataType};

/// Built-in conversions expanded at the call site instead of being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline {
    Str,
    Int,
    Float,
    Len,
}

impl Inline {
    pub const ALL: [Inline; 4] = [Inline::Str, Inline::Int, Inline::Float, Inline::Len];

    pub fn from_name(name: &str) -> Option<Self> {
        Inline::ALL.into_iter().find(|inline| inline.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Inline::Str => "str",
            Inline::Int => "int",
            Inline::Float => "float",
            Inline::Len => "len",
        }
    }

    pub fn return_type(self) -> DataType {
        match self {
            Inline::Str => DataType::Str,
            Inline::Int | Inline::Len => DataType::Int,
            Inline::Float => DataType::Float,
        }
    }

    /// What to emit after the argument has been pushed, or `None` when
    /// the argument type is not accepted.
    pub fn expansion(self, arg: &DataType) -> Option<Vec<Instruction>> {
        let parse = |returns: &str, owner: &str| {
            Instruction::Call(MethodRef::on(returns, owner, "Parse").with_params(["string"]))
        };

        let code = match (self, arg) {
            (Inline::Str, _) => {
                let atomic = arg.atomic()?;
                vec![Instruction::Call(
                    MethodRef::on("string", "[mscorlib]System.Convert", "ToString")
                        .with_params([atomic.il_name()]),
                )]
            }
            (Inline::Int, DataType::Int) | (Inline::Float, DataType::Float) => vec![],
            (Inline::Int, DataType::Float) => vec![Instruction::ConvI4],
            (Inline::Int, DataType::Str) => vec![parse("int32", AtomicType::Int.runtime_class())],
            (Inline::Float, DataType::Int) => vec![Instruction::ConvR8],
            (Inline::Float, DataType::Str) => {
                vec![parse("float64", AtomicType::Float.runtime_class())]
            }
            (Inline::Len, DataType::Array { dimension: 1, .. }) => {
                vec![Instruction::Ldlen, Instruction::ConvI4]
            }
            (Inline::Len, DataType::Str) => vec![Instruction::Callvirt(MethodRef::instance(
                "int32",
                AtomicType::Str.runtime_class(),
                "get_Length",
            ))],
            (Inline::Len, DataType::Dict { .. }) => vec![Instruction::Callvirt(MethodRef::instance(
                "int32",
                arg.il_name(),
                "get_Count",
            ))],
            _ => return None,
        };
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(inline: Inline, arg: DataType) -> Option<Vec<String>> {
        inline
            .expansion(&arg)
            .map(|code| code.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn conversions() {
        assert_eq!(
            rendered(Inline::Str, DataType::Float).unwrap(),
            vec!["call string [mscorlib]System.Convert::ToString(float64)"]
        );
        assert_eq!(
            rendered(Inline::Int, DataType::Float).unwrap(),
            vec!["conv.i4"]
        );
        assert_eq!(
            rendered(Inline::Int, DataType::Str).unwrap(),
            vec!["call int32 [mscorlib]System.Int32::Parse(string)"]
        );
        assert_eq!(
            rendered(Inline::Float, DataType::Int).unwrap(),
            vec!["conv.r8"]
        );
        assert_eq!(
            rendered(Inline::Float, DataType::Float).unwrap(),
            Vec::<String>::new()
        );
        assert_eq!(rendered(Inline::Int, DataType::Bool), None);
    }

    #[test]
    fn lengths() {
        let array = DataType::array(1, AtomicType::Int).unwrap();
        assert_eq!(
            rendered(Inline::Len, array).unwrap(),
            vec!["ldlen", "conv.i4"]
        );
        let grid = DataType::array(2, AtomicType::Int).unwrap();
        assert_eq!(rendered(Inline::Len, grid), None);
        let dict = DataType::dict(AtomicType::Str, AtomicType::Int);
        assert_eq!(
            rendered(Inline::Len, dict).unwrap(),
            vec!["callvirt instance int32 class [mscorlib]System.Collections.Generic.Dictionary`2<string,int32>::get_Count()"]
        );
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Inline::from_name("len"), Some(Inline::Len));
        assert_eq!(Inline::from_name("length"), None);
    }
}
