use indexmap::IndexMap;

use crate::ast::ConstValue;
use crate::error::CompilerError;
use crate::types::DataType;

pub trait Symbol {
    fn name(&self) -> &str;
}

/// Name-unique registry that remembers insertion order, so the index of a
/// symbol doubles as its argument or local slot.
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    symbols: IndexMap<String, T>,
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        SymbolTable {
            symbols: IndexMap::new(),
        }
    }
}

impl<T: Symbol> SymbolTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Adds `symbol` and returns its index.
    pub fn define(&mut self, symbol: T) -> Result<usize, CompilerError> {
        let name = symbol.name().to_string();
        if self.is_defined(&name) {
            return Err(CompilerError::semantic(format!(
                "Symbol '{}' was already defined",
                name
            )));
        }
        let (index, _) = self.symbols.insert_full(name, symbol);
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Result<&T, CompilerError> {
        self.symbols.get(name).ok_or_else(|| undefined(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut T, CompilerError> {
        self.symbols.get_mut(name).ok_or_else(|| undefined(name))
    }

    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.symbols.get(name)
    }

    /// Index and symbol in one lookup.
    pub fn get_full(&self, name: &str) -> Option<(usize, &T)> {
        self.symbols
            .get_full(name)
            .map(|(index, _, symbol)| (index, symbol))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.symbols.values()
    }
}

fn undefined(name: &str) -> CompilerError {
    CompilerError::semantic(format!("Symbol '{}' is undefined", name))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: DataType,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: DataType) -> Self {
        Variable {
            name: name.into(),
            ty,
        }
    }
}

impl Symbol for Variable {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A named compile-time value.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub value: ConstValue,
}

impl Constant {
    pub fn new(name: impl Into<String>, value: ConstValue) -> Self {
        Constant {
            name: name.into(),
            value,
        }
    }

    pub fn ty(&self) -> DataType {
        self.value.ty()
    }
}

impl Symbol for Constant {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_insertion_order() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define(Variable::new("b", DataType::Int)).unwrap(), 0);
        assert_eq!(table.define(Variable::new("a", DataType::Str)).unwrap(), 1);
        assert_eq!(
            table.get_full("a").map(|(i, v)| (i, v.ty)),
            Some((1, DataType::Str))
        );
        assert_eq!(table.get_full("b").map(|(i, _)| i), Some(0));
        assert!(table.get_full("c").is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn duplicates_and_unknown_names_are_errors() {
        let mut table = SymbolTable::new();
        table.define(Variable::new("x", DataType::Int)).unwrap();
        let err = table.define(Variable::new("x", DataType::Float)).unwrap_err();
        assert_eq!(err.message(), "Symbol 'x' was already defined");
        assert_eq!(
            table.get("y").unwrap_err().message(),
            "Symbol 'y' is undefined"
        );
    }
}
