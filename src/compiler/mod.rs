mod inline;
pub mod runtime;

use std::fmt::Write;

use tracing::debug;

use crate::ast::{ConstValue, Function, Item, OperatorTable, Program};
use crate::backend::{Codegen, Method, ENTRY_POINT};
use crate::error::CompilerError;
use crate::frontend::{Parser, Token};
use crate::symbols::{Constant, SymbolTable, Variable};

pub use inline::Inline;
use runtime::{is_runtime_function, RUNTIME_FUNCTIONS};

/// Everything one compilation unit knows about: globals, constants,
/// functions (runtime library included) and the output program name.
pub struct Compiler {
    program_name: String,
    ops: OperatorTable,
    globals: SymbolTable<Variable>,
    constants: SymbolTable<Constant>,
    functions: SymbolTable<Method>,
}

/// Replaces everything but ASCII letters and digits with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl Compiler {
    pub fn new(program_name: &str) -> Result<Self, CompilerError> {
        let mut compiler = Compiler {
            program_name: sanitize_name(program_name),
            ops: OperatorTable::new(),
            globals: SymbolTable::new(),
            constants: SymbolTable::new(),
            functions: SymbolTable::new(),
        };
        compiler.add_runtime_library()?;
        Ok(compiler)
    }

    fn add_runtime_library(&mut self) -> Result<(), CompilerError> {
        self.constants
            .define(Constant::new("true", ConstValue::Bool(true)))?;
        self.constants
            .define(Constant::new("false", ConstValue::Bool(false)))?;

        for def in RUNTIME_FUNCTIONS {
            self.functions.define(def.build()?)?;
        }
        Ok(())
    }

    pub fn globals(&self) -> &SymbolTable<Variable> {
        &self.globals
    }

    pub fn constants(&self) -> &SymbolTable<Constant> {
        &self.constants
    }

    pub fn function(&self, name: &str) -> Option<&Method> {
        self.functions.lookup(name)
    }

    /// Parses `tokens`; `const` definitions land in this compiler's
    /// constant table.
    pub fn parse(&mut self, tokens: &[Token]) -> Result<Program, CompilerError> {
        Parser::new(tokens, &self.ops, &mut self.constants)?.parse()
    }

    fn is_reserved(name: &str) -> bool {
        Inline::from_name(name).is_some() || is_runtime_function(name)
    }

    fn check_not_constant(&self, name: &str) -> Result<(), CompilerError> {
        if self.constants.is_defined(name) {
            return Err(CompilerError::semantic(format!(
                "'{}' is already defined as a constant",
                name
            )));
        }
        Ok(())
    }

    pub fn declare_global(&mut self, global: Variable) -> Result<(), CompilerError> {
        self.check_not_constant(&global.name)?;
        self.globals.define(global)?;
        Ok(())
    }

    /// Registers a user function so that calls to it resolve before its
    /// body is compiled.
    pub fn declare_function(&mut self, method: Method) -> Result<(), CompilerError> {
        let name = method.name();
        if Self::is_reserved(name) {
            return Err(CompilerError::semantic(format!(
                "'{}' is a reserved function name",
                name
            )));
        }
        if method.is_entry_point() {
            if !method.return_type().is_void() {
                return Err(CompilerError::semantic(format!(
                    "Entry point '{}' must return void",
                    ENTRY_POINT
                )));
            }
            if !method.args().is_empty() {
                return Err(CompilerError::semantic(format!(
                    "Entry point '{}' takes no arguments",
                    ENTRY_POINT
                )));
            }
        }
        for arg in method.args().iter() {
            self.check_not_constant(&arg.name)?;
        }
        self.functions.define(method)?;
        Ok(())
    }

    fn declare_user_function(&mut self, function: &Function) -> Result<(), CompilerError> {
        let mut args = SymbolTable::new();
        for arg in &function.args {
            args.define(arg.clone())?;
        }
        let name = function.name.clone();
        self.declare_function(Method::new(name, function.return_type, args))
    }

    /// Declares every global and function of `program`, then generates
    /// the function bodies in definition order.
    pub fn compile(&mut self, program: &Program) -> Result<(), CompilerError> {
        for item in &program.items {
            match item {
                Item::Global {
                    variables,
                    position,
                } => {
                    for global in variables {
                        self.declare_global(global.clone())
                            .map_err(|err| err.at(position))?;
                    }
                }
                Item::Function(function) => {
                    self.declare_user_function(function)
                        .map_err(|err| err.at(&function.position))?;
                }
                Item::Constant(_) => {}
            }
        }

        for function in program.functions() {
            let method = Codegen::new(self, &function.name)?.compile_function(function)?;
            *self.functions.get_mut(&function.name)? = method;
        }
        debug!(
            program = %self.program_name,
            functions = self.functions.len(),
            globals = self.globals.len(),
            "compiled program"
        );
        Ok(())
    }

    fn prologue(&self) -> String {
        let name = &self.program_name;
        format!(
            ".assembly extern mscorlib {{}}\n.assembly {name}\n{{\n\t.ver 1:0:0:0\n}}\n\
             .module {name}.exe\n\
             .field private static class [mscorlib]System.Random __RNG\n"
        )
    }

    /// The whole program as ilasm source.
    pub fn code(&self) -> Result<String, CompilerError> {
        if !self.functions.is_defined(ENTRY_POINT) {
            return Err(CompilerError::semantic(format!(
                "Entry point function '{}' is missing",
                ENTRY_POINT
            )));
        }

        let mut text = self.prologue();
        for global in self.globals.iter() {
            let _ = writeln!(
                text,
                ".field private static {} {}",
                global.ty.il_name(),
                global.name
            );
        }
        for function in self.functions.iter() {
            text.push_str(&function.code()?);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Lexer;
    use crate::types::DataType;

    fn compile(source: &str) -> Result<String, CompilerError> {
        let mut compiler = Compiler::new("test")?;
        let tokens = Lexer::new().tokenize(source)?;
        let program = compiler.parse(&tokens)?;
        compiler.compile(&program)?;
        compiler.code()
    }

    #[test]
    fn program_names_are_sanitized() {
        assert_eq!(sanitize_name("my-prog.v2"), "my_prog_v2");
        let compiler = Compiler::new("hello world").unwrap();
        assert_eq!(compiler.program_name, "hello_world");
        assert!(compiler.prologue().starts_with(
            ".assembly extern mscorlib {}\n.assembly hello_world\n{\n\t.ver 1:0:0:0\n}\n\
             .module hello_world.exe\n"
        ));
    }

    #[test]
    fn runtime_library_comes_first() {
        let code = compile("def main() { printn(\"hi\") }").unwrap();
        let print = code.find("void print(string)").unwrap();
        let main = code.find("void main()").unwrap();
        assert!(print < main);
        assert!(code.contains("ldstr \"hi\"\ncall void printn(string)\nret\n"));
    }

    #[test]
    fn entry_point_rules() {
        assert_eq!(
            compile("def f() { }").unwrap_err().message(),
            "Entry point function 'main' is missing"
        );
        assert_eq!(
            compile("def main%() { return 0 }").unwrap_err().message(),
            "Entry point 'main' must return void"
        );
        assert_eq!(
            compile("def main(x%) { }").unwrap_err().message(),
            "Entry point 'main' takes no arguments"
        );
    }

    #[test]
    fn reserved_and_duplicate_names() {
        let message = |source: &str| compile(source).unwrap_err().message().to_string();
        assert_eq!(
            message("def print(s$) { }\ndef main() { }"),
            "'print' is a reserved function name"
        );
        assert_eq!(
            message("def len%(s$) { return 0 }\ndef main() { }"),
            "'len' is a reserved function name"
        );
        assert_eq!(
            message("def f() { }\ndef f() { }\ndef main() { }"),
            "Symbol 'f' was already defined"
        );
        assert_eq!(
            message("const n% = 1\nglobal n%\ndef main() { }"),
            "'n' is already defined as a constant"
        );
    }

    #[test]
    fn declaration_errors_point_at_the_declaration() {
        let err = compile("global a%\nglobal b$, a%\ndef main() { }").unwrap_err();
        assert_eq!(err.message(), "Symbol 'a' was already defined");
        assert_eq!(err.position().map(|p| (p.line, p.column)), Some((2, 0)));

        let err = compile("def main() { }\n\ndef  main() { }").unwrap_err();
        assert_eq!(err.message(), "Symbol 'main' was already defined");
        assert_eq!(err.position().map(|p| (p.line, p.column)), Some((3, 5)));

        let err = compile("def f(a%, a%) { }\ndef main() { }").unwrap_err();
        assert_eq!(err.message(), "Symbol 'a' was already defined");
        assert_eq!(err.position().map(|p| p.line), Some(1));
    }

    #[test]
    fn globals_become_static_fields() {
        let code = compile("global count%, names$[]\ndef main() { count% = 1 }").unwrap();
        assert!(code.contains(
            ".field private static int32 count\n.field private static string[] names\n"
        ));
        assert!(code.contains("ldc.i4.1\nstsfld int32 count\n"));
        let compiler = Compiler::new("x").unwrap();
        assert!(compiler.globals().is_empty());
        assert_eq!(
            compiler.constants().get("true").unwrap().ty(),
            DataType::Bool
        );
    }
}
