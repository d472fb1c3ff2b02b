//! Indented dump of a parsed program, one node per line.

use std::fmt::Write;

use crate::ast::{Assign, Call, Expr, ExprKind, Item, Program, Stmt};
use crate::symbols::Variable;

const INDENT: &str = "  ";

pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::default();
    printer.line(0, "Program");
    for item in &program.items {
        printer.item(1, item);
    }
    printer.out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(0, expr);
    printer.out
}

fn declaration(variable: &Variable) -> String {
    format!("{}: {}", variable.name, variable.ty)
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        let _ = writeln!(self.out, "{}{}", INDENT.repeat(depth), text.as_ref());
    }

    fn item(&mut self, depth: usize, item: &Item) {
        match item {
            Item::Function(function) => {
                let args: Vec<String> = function.args.iter().map(declaration).collect();
                self.line(
                    depth,
                    format!(
                        "Function {}({}) -> {}",
                        function.name,
                        args.join(", "),
                        function.return_type
                    ),
                );
                self.block(depth + 1, &function.body);
            }
            Item::Global { variables, .. } => {
                let names: Vec<String> = variables.iter().map(declaration).collect();
                self.line(depth, format!("Global {}", names.join(", ")));
            }
            Item::Constant(constant) => {
                let (name, value) = (&constant.name, &constant.value);
                let text = format!("Const {}: {} = {}", name, constant.ty(), value);
                self.line(depth, text);
            }
        }
    }

    fn block(&mut self, depth: usize, block: &[Stmt]) {
        for stmt in block {
            self.stmt(depth, stmt);
        }
    }

    fn assign(&mut self, depth: usize, assign: &Assign) {
        self.line(depth, format!("Assign {}", declaration(&assign.target)));
        self.expr(depth + 1, &assign.value);
    }

    fn call(&mut self, depth: usize, call: &Call) {
        self.line(depth, format!("Call {}: {}", call.name, call.return_type));
        for arg in &call.args {
            self.expr(depth + 1, arg);
        }
    }

    fn stmt(&mut self, depth: usize, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(assign) => self.assign(depth, assign),
            Stmt::ArrayAssign { target, value } => {
                let sigil = target.element.sigil();
                self.line(depth, format!("ArrayAssign {}{}", target.name, sigil));
                for index in &target.indices {
                    self.expr(depth + 1, index);
                }
                self.expr(depth + 1, value);
            }
            Stmt::DictAssign { target, value } => {
                let sigils = format!("{}{}", target.key.sigil(), target.value.sigil());
                self.line(depth, format!("DictAssign {}{}", target.name, sigils));
                self.expr(depth + 1, &target.key_expr);
                self.expr(depth + 1, value);
            }
            Stmt::Return { value, .. } => {
                self.line(depth, "Return");
                if let Some(value) = value {
                    self.expr(depth + 1, value);
                }
            }
            Stmt::If {
                condition,
                consequent,
                alternative,
            } => {
                self.line(depth, "If");
                self.expr(depth + 1, condition);
                self.line(depth, "Then");
                self.block(depth + 1, consequent);
                if let Some(alternative) = alternative {
                    self.line(depth, "Else");
                    self.block(depth + 1, alternative);
                }
            }
            Stmt::While {
                condition,
                body,
                do_while,
            } => {
                self.line(depth, if *do_while { "DoWhile" } else { "While" });
                self.expr(depth + 1, condition);
                self.line(depth, "Do");
                self.block(depth + 1, body);
            }
            Stmt::For {
                from,
                to,
                step,
                body,
                ..
            } => {
                self.line(depth, "For");
                self.assign(depth + 1, from);
                self.line(depth, "To");
                self.expr(depth + 1, to);
                self.line(depth, "Step");
                self.expr(depth + 1, step);
                self.line(depth, "Do");
                self.block(depth + 1, body);
            }
            Stmt::Call(call) => self.call(depth, call),
        }
    }

    fn expr(&mut self, depth: usize, expr: &Expr) {
        match &expr.kind {
            ExprKind::Constant(value) => {
                self.line(depth, format!("Constant {}: {}", value, expr.ty));
            }
            ExprKind::Variable { name, .. } => {
                self.line(depth, format!("Variable {}: {}", name, expr.ty));
            }
            ExprKind::Unary { op, operand } => {
                self.line(depth, format!("Unary {}: {}", op.symbol(), expr.ty));
                self.expr(depth + 1, operand);
            }
            ExprKind::Binary {
                left, op, right, ..
            } => {
                self.line(depth, format!("Binary {}: {}", op.symbol(), expr.ty));
                self.expr(depth + 1, left);
                self.expr(depth + 1, right);
            }
            ExprKind::Call(call) => self.call(depth, call),
            ExprKind::NewArray { dimensions, .. } => {
                self.line(depth, format!("NewArray {}", expr.ty));
                for dimension in dimensions {
                    self.expr(depth + 1, dimension);
                }
            }
            ExprKind::NewDict { .. } => self.line(depth, format!("NewDict {}", expr.ty)),
            ExprKind::ArrayValue(value) => {
                self.line(depth, format!("ArrayValue {}: {}", value.name, expr.ty));
                for index in &value.indices {
                    self.expr(depth + 1, index);
                }
            }
            ExprKind::DictValue(value) => {
                self.line(depth, format!("DictValue {}: {}", value.name, expr.ty));
                self.expr(depth + 1, &value.key_expr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::tests::parse_program;

    #[test]
    fn function_with_return() {
        let program = parse_program("def DoSum(a%, b%) % { return a% + b% }").unwrap();
        assert_eq!(
            print_program(&program),
            "Program\n\
             \x20 Function DoSum(a: int%, b: int%) -> int%\n\
             \x20   Return\n\
             \x20     Binary +: int%\n\
             \x20       Variable a: int%\n\
             \x20       Variable b: int%\n"
        );
    }

    #[test]
    fn definitions_and_control_flow() {
        let source = "const pi# = 3.14\nglobal names$[]\n\
                      def main() { for i% = 1 to 3 { if i% > 1 { names$[i%] = \"x\" } } }";
        let text = print_program(&parse_program(source).unwrap());
        assert!(text.contains("  Const pi: float# = 3.14\n  Global names: array$[]\n"));
        assert!(text.contains(
            "    For\n      Assign i: int%\n        Constant 1: int%\n    \
             To\n      Constant 3: int%\n    Step\n      Constant 1: int%\n    \
             Do\n      If\n"
        ));
        assert!(text.contains(
            "        ArrayAssign names$\n          Variable i: int%\n          \
             Constant \"x\": string$\n"
        ));
    }

    #[test]
    fn single_expression() {
        let program = parse_program("def f() { x# = ~y# * 2.0 }").unwrap();
        let value = match &program.items[0] {
            Item::Function(function) => match &function.body[0] {
                Stmt::Assign(assign) => assign.value.clone(),
                other => panic!("unexpected statement {:?}", other),
            },
            other => panic!("unexpected item {:?}", other),
        };
        assert_eq!(
            print_expr(&value),
            "Binary *: float#\n  Unary ~: float#\n    Variable y: float#\n  Constant 2.0: float#\n"
        );
    }
}
