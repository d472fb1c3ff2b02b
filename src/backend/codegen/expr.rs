use super::Codegen;
use crate::ast::{ArrayValue, BinaryOp, DictValue, Expr, ExprKind, UnaryOp};
use crate::backend::instruction::{Instruction, MethodRef};
use crate::error::CompilerError;
use crate::types::{AtomicType, DataType};

const STRING_CLASS: &str = "[mscorlib]System.String";

fn string_method(returns: &str, name: &str) -> Instruction {
    let method = MethodRef::on(returns, STRING_CLASS, name).with_params(["string", "string"]);
    Instruction::Call(method)
}

fn int_params(count: usize) -> Vec<&'static str> {
    vec!["int32"; count]
}

/// `Get`/`Set` of a multi-dimensional array class.
fn array_accessor(array: &DataType, element: AtomicType, dims: usize, store: bool) -> MethodRef {
    let mut params = int_params(dims);
    if store {
        params.push(element.il_name());
        MethodRef::instance("void", array.il_name(), "Set").with_params(params)
    } else {
        MethodRef::instance(element.il_name(), array.il_name(), "Get").with_params(params)
    }
}

impl Codegen<'_> {
    pub(super) fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompilerError> {
        match &expr.kind {
            ExprKind::Constant(value) => self.load_constant(value),
            ExprKind::Variable { name, position } => self.load_variable(name, expr.ty, position),
            ExprKind::Unary { op, operand } => {
                self.compile_expr(operand)?;
                match op {
                    UnaryOp::Neg => self.emit(Instruction::Neg),
                    UnaryOp::Not => self.emit_all([Instruction::LdcI4(0), Instruction::Ceq]),
                }
            }
            ExprKind::Binary {
                left,
                op,
                right,
                operand_ty,
            } => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit_binary(*op, operand_ty)
            }
            ExprKind::Call(call) => self.compile_call(call),
            ExprKind::NewArray {
                element,
                dimensions,
            } => {
                for dimension in dimensions {
                    self.compile_expr(dimension)?;
                }
                if dimensions.len() == 1 {
                    self.emit(Instruction::Newarr(*element))
                } else {
                    let ctor = MethodRef::constructor(expr.ty.il_name())
                        .with_params(int_params(dimensions.len()));
                    self.emit(Instruction::Newobj(ctor))
                }
            }
            ExprKind::NewDict { .. } => {
                self.emit(Instruction::Newobj(MethodRef::constructor(expr.ty.il_name())))
            }
            ExprKind::ArrayValue(value) => self.load_element(value),
            ExprKind::DictValue(value) => {
                let dict = self.push_dict(value)?;
                let get = MethodRef::instance("!1", dict.il_name(), "get_Item").with_params(["!0"]);
                self.emit(Instruction::Callvirt(get))
            }
        }
    }

    /// Both operands are on the stack.
    fn emit_binary(&mut self, op: BinaryOp, operand_ty: &DataType) -> Result<(), CompilerError> {
        if *operand_ty == DataType::Str {
            let instruction = match op {
                BinaryOp::Add => string_method("string", "Concat"),
                BinaryOp::Eq => string_method("bool", "op_Equality"),
                BinaryOp::NotEq => string_method("bool", "op_Inequality"),
                _ => {
                    return Err(CompilerError::internal(format!(
                        "No lowering for '{}' on strings",
                        op.symbol()
                    )))
                }
            };
            return self.emit(instruction);
        }

        use Instruction::*;
        match op {
            BinaryOp::Or => self.emit(Or),
            BinaryOp::And => self.emit(And),
            BinaryOp::Eq => self.emit(Ceq),
            BinaryOp::NotEq => self.emit_all([Ceq, LdcI4(0), Ceq]),
            BinaryOp::Less => self.emit(Clt),
            BinaryOp::LessEq => self.emit_all([Cgt, LdcI4(0), Ceq]),
            BinaryOp::Greater => self.emit(Cgt),
            BinaryOp::GreaterEq => self.emit_all([Clt, LdcI4(0), Ceq]),
            BinaryOp::Add => self.emit(Add),
            BinaryOp::Sub => self.emit(Sub),
            BinaryOp::Mul => self.emit(Mul),
            BinaryOp::Div => self.emit(Div),
            BinaryOp::Mod => self.emit(Rem),
        }
    }

    /// Pushes the array and its indices; returns the array type.
    pub(super) fn push_array(&mut self, value: &ArrayValue) -> Result<DataType, CompilerError> {
        let array = value.array_type();
        self.load_variable(&value.name, array, &value.position)?;
        for index in &value.indices {
            self.compile_expr(index)?;
        }
        Ok(array)
    }

    fn load_element(&mut self, value: &ArrayValue) -> Result<(), CompilerError> {
        let array = self.push_array(value)?;
        let dims = value.indices.len();
        if dims == 1 {
            self.emit(Instruction::Ldelem(value.element))
        } else {
            let get = array_accessor(&array, value.element, dims, false);
            self.emit(Instruction::Call(get))
        }
    }

    /// `value` must already be on the stack above the array and indices.
    pub(super) fn emit_store_element(&mut self, value: &ArrayValue) -> Result<(), CompilerError> {
        let dims = value.indices.len();
        if dims == 1 {
            self.emit(Instruction::Stelem(value.element))
        } else {
            let set = array_accessor(&value.array_type(), value.element, dims, true);
            self.emit(Instruction::Call(set))
        }
    }

    /// Pushes the dictionary and the key; returns the dictionary type.
    pub(super) fn push_dict(&mut self, value: &DictValue) -> Result<DataType, CompilerError> {
        let dict = value.dict_type();
        self.load_variable(&value.name, dict, &value.position)?;
        self.compile_expr(&value.key_expr)?;
        Ok(dict)
    }
}
