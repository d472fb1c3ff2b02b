use std::fmt;

use crate::error::CompilerError;

pub const MAX_ARRAY_DIMENSION: u8 = 4;

/// Scalar types a sigil can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicType {
    Bool,
    Int,
    Float,
    Str,
}

impl AtomicType {
    pub fn sigil(self) -> char {
        match self {
            AtomicType::Bool => '!',
            AtomicType::Int => '%',
            AtomicType::Float => '#',
            AtomicType::Str => '$',
        }
    }

    pub fn il_name(self) -> &'static str {
        match self {
            AtomicType::Bool => "bool",
            AtomicType::Int => "int32",
            AtomicType::Float => "float64",
            AtomicType::Str => "string",
        }
    }

    /// Name of the boxed runtime class, as used by `newarr`.
    pub fn runtime_class(self) -> &'static str {
        match self {
            AtomicType::Bool => "[mscorlib]System.Boolean",
            AtomicType::Int => "[mscorlib]System.Int32",
            AtomicType::Float => "[mscorlib]System.Double",
            AtomicType::Str => "[mscorlib]System.String",
        }
    }

    /// Suffix of the `ldelem`/`stelem` family.
    pub fn element_suffix(self) -> &'static str {
        match self {
            AtomicType::Bool => "i1",
            AtomicType::Int => "i4",
            AtomicType::Float => "r8",
            AtomicType::Str => "ref",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Void,
    Bool,
    Int,
    Float,
    Str,
    Array { dimension: u8, element: AtomicType },
    Dict { key: AtomicType, value: AtomicType },
}

impl From<AtomicType> for DataType {
    fn from(atomic: AtomicType) -> Self {
        match atomic {
            AtomicType::Bool => DataType::Bool,
            AtomicType::Int => DataType::Int,
            AtomicType::Float => DataType::Float,
            AtomicType::Str => DataType::Str,
        }
    }
}

impl DataType {
    pub fn array(dimension: usize, element: AtomicType) -> Result<Self, CompilerError> {
        if dimension == 0 || dimension > MAX_ARRAY_DIMENSION as usize {
            return Err(CompilerError::semantic(
                "Only 1,2,3 and 4-dimension arrays are supported",
            ));
        }
        Ok(DataType::Array {
            dimension: dimension as u8,
            element,
        })
    }

    pub fn dict(key: AtomicType, value: AtomicType) -> Self {
        DataType::Dict { key, value }
    }

    pub fn atomic(&self) -> Option<AtomicType> {
        match self {
            DataType::Bool => Some(AtomicType::Bool),
            DataType::Int => Some(AtomicType::Int),
            DataType::Float => Some(AtomicType::Float),
            DataType::Str => Some(AtomicType::Str),
            _ => None,
        }
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic().is_some()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, DataType::Void)
    }

    /// Type as written in ilasm signatures and field declarations.
    pub fn il_name(&self) -> String {
        match self {
            DataType::Void => "void".to_string(),
            DataType::Array { dimension, element } => {
                if *dimension == 1 {
                    format!("{}[]", element.il_name())
                } else {
                    let bounds = vec!["0..."; *dimension as usize].join(",");
                    format!("{}[{}]", element.il_name(), bounds)
                }
            }
            DataType::Dict { key, value } => format!(
                "class [mscorlib]System.Collections.Generic.Dictionary`2<{},{}>",
                key.il_name(),
                value.il_name()
            ),
            other => match other.atomic() {
                Some(atomic) => atomic.il_name().to_string(),
                None => "void".to_string(),
            },
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Void => write!(f, "void"),
            DataType::Bool => write!(f, "bool!"),
            DataType::Int => write!(f, "int%"),
            DataType::Float => write!(f, "float#"),
            DataType::Str => write!(f, "string$"),
            DataType::Array { dimension, element } => {
                write!(f, "array{}", element.sigil())?;
                for _ in 0..*dimension {
                    write!(f, "[]")?;
                }
                Ok(())
            }
            DataType::Dict { key, value } => {
                write!(f, "dict{}{}()", key.sigil(), value.sigil())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_diagnostic_names() {
        assert_eq!(DataType::Int.to_string(), "int%");
        assert_eq!(
            DataType::array(2, AtomicType::Float).unwrap().to_string(),
            "array#[][]"
        );
        assert_eq!(
            DataType::dict(AtomicType::Str, AtomicType::Int).to_string(),
            "dict$%()"
        );
    }

    #[test]
    fn renders_il_names() {
        assert_eq!(DataType::Float.il_name(), "float64");
        assert_eq!(
            DataType::array(1, AtomicType::Int).unwrap().il_name(),
            "int32[]"
        );
        assert_eq!(
            DataType::array(3, AtomicType::Str).unwrap().il_name(),
            "string[0...,0...,0...]"
        );
        assert_eq!(
            DataType::dict(AtomicType::Str, AtomicType::Bool).il_name(),
            "class [mscorlib]System.Collections.Generic.Dictionary`2<string,bool>"
        );
    }

    #[test]
    fn rejects_out_of_range_dimensions() {
        assert!(DataType::array(0, AtomicType::Int).is_err());
        assert!(DataType::array(5, AtomicType::Int).is_err());
        assert!(DataType::array(4, AtomicType::Int).is_ok());
    }

    #[test]
    fn equality_is_structural() {
        let a = DataType::array(2, AtomicType::Int).unwrap();
        assert_eq!(a, DataType::array(2, AtomicType::Int).unwrap());
        assert_ne!(a, DataType::array(1, AtomicType::Int).unwrap());
        assert_ne!(a, DataType::array(2, AtomicType::Float).unwrap());
        assert_ne!(
            DataType::dict(AtomicType::Int, AtomicType::Str),
            DataType::dict(AtomicType::Str, AtomicType::Int)
        );
    }
}
