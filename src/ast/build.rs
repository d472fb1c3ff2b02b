use super::*;
use crate::error::CompilerError;
use crate::types::MAX_ARRAY_DIMENSION;

pub(crate) fn type_mismatch(left: &DataType, right: &DataType) -> CompilerError {
    CompilerError::semantic(format!("Type mismatch: {} and {}", left, right))
}

fn expect_same(left: &DataType, right: &DataType) -> Result<(), CompilerError> {
    if left == right {
        Ok(())
    } else {
        Err(type_mismatch(left, right))
    }
}

fn check_indices(indices: &[Expr], message: &str) -> Result<(), CompilerError> {
    if indices.is_empty() || indices.len() > MAX_ARRAY_DIMENSION as usize {
        return Err(CompilerError::semantic(
            "Only 1,2,3 and 4-dimension arrays are supported",
        ));
    }
    if indices.iter().any(|index| index.ty != DataType::Int) {
        return Err(CompilerError::semantic(message));
    }
    Ok(())
}

impl Expr {
    pub fn constant(value: ConstValue) -> Self {
        let ty = value.ty();
        Expr {
            kind: ExprKind::Constant(value),
            ty,
        }
    }

    pub fn variable(name: impl Into<String>, ty: DataType, position: Position) -> Self {
        Expr {
            kind: ExprKind::Variable {
                name: name.into(),
                position,
            },
            ty,
        }
    }

    pub fn call(call: Call) -> Self {
        let ty = call.return_type;
        Expr {
            kind: ExprKind::Call(call),
            ty,
        }
    }

    pub fn new_array(element: AtomicType, dimensions: Vec<Expr>) -> Result<Self, CompilerError> {
        check_indices(&dimensions, "Array length must be int")?;
        let ty = DataType::array(dimensions.len(), element)?;
        Ok(Expr {
            kind: ExprKind::NewArray {
                element,
                dimensions,
            },
            ty,
        })
    }

    pub fn new_dict(key: AtomicType, value: AtomicType) -> Self {
        Expr {
            kind: ExprKind::NewDict { key, value },
            ty: DataType::dict(key, value),
        }
    }

    pub fn array_value(value: ArrayValue) -> Self {
        let ty = value.element.into();
        Expr {
            kind: ExprKind::ArrayValue(value),
            ty,
        }
    }

    pub fn dict_value(value: DictValue) -> Self {
        let ty = value.value.into();
        Expr {
            kind: ExprKind::DictValue(value),
            ty,
        }
    }

    pub fn as_constant(&self) -> Option<&ConstValue> {
        match &self.kind {
            ExprKind::Constant(value) => Some(value),
            _ => None,
        }
    }
}

impl ArrayValue {
    pub fn new(
        name: impl Into<String>,
        element: AtomicType,
        indices: Vec<Expr>,
        position: Position,
    ) -> Result<Self, CompilerError> {
        check_indices(&indices, "Array index must be int")?;
        Ok(ArrayValue {
            name: name.into(),
            element,
            indices,
            position,
        })
    }

    /// Type of the whole array this element belongs to.
    pub fn array_type(&self) -> DataType {
        DataType::Array {
            dimension: self.indices.len() as u8,
            element: self.element,
        }
    }
}

impl DictValue {
    pub fn new(
        name: impl Into<String>,
        key: AtomicType,
        value: AtomicType,
        key_expr: Expr,
        position: Position,
    ) -> Result<Self, CompilerError> {
        expect_same(&DataType::from(key), &key_expr.ty)?;
        Ok(DictValue {
            name: name.into(),
            key,
            value,
            key_expr: Box::new(key_expr),
            position,
        })
    }

    pub fn dict_type(&self) -> DataType {
        DataType::dict(self.key, self.value)
    }
}

impl Assign {
    pub fn new(target: Variable, value: Expr, position: Position) -> Result<Self, CompilerError> {
        expect_same(&target.ty, &value.ty)?;
        Ok(Assign {
            target,
            value,
            position,
        })
    }

    /// The assigned variable read back as an expression.
    pub fn target_expr(&self) -> Expr {
        let target = &self.target;
        Expr::variable(target.name.clone(), target.ty, self.position.clone())
    }
}

impl Stmt {
    pub fn array_assign(target: ArrayValue, value: Expr) -> Result<Self, CompilerError> {
        expect_same(&DataType::from(target.element), &value.ty)?;
        Ok(Stmt::ArrayAssign { target, value })
    }

    pub fn dict_assign(target: DictValue, value: Expr) -> Result<Self, CompilerError> {
        expect_same(&DataType::from(target.value), &value.ty)?;
        Ok(Stmt::DictAssign { target, value })
    }

    pub fn new_if(
        condition: Expr,
        consequent: Vec<Stmt>,
        alternative: Option<Vec<Stmt>>,
    ) -> Result<Self, CompilerError> {
        if condition.ty != DataType::Bool {
            return Err(CompilerError::semantic(
                "If statement requires a boolean expression as its condition",
            ));
        }
        Ok(Stmt::If {
            condition,
            consequent,
            alternative,
        })
    }

    pub fn new_while(
        condition: Expr,
        body: Vec<Stmt>,
        do_while: bool,
    ) -> Result<Self, CompilerError> {
        if condition.ty != DataType::Bool {
            return Err(CompilerError::semantic(
                "Condition in WHILE loop must be boolean",
            ));
        }
        Ok(Stmt::While {
            condition,
            body,
            do_while,
        })
    }

    /// A missing step becomes the literal one of the counter's type.
    pub fn new_for(
        from: Assign,
        to: Expr,
        step: Option<Expr>,
        body: Vec<Stmt>,
        position: Position,
    ) -> Result<Self, CompilerError> {
        let counter = from.target.ty;
        if !counter.is_numeric() {
            return Err(CompilerError::semantic(
                "FOR loop counter must be int or float",
            ));
        }
        expect_same(&counter, &to.ty)?;

        let step = match step {
            Some(step) => {
                expect_same(&counter, &step.ty)?;
                step
            }
            None if counter == DataType::Int => Expr::constant(ConstValue::Int(1)),
            None => Expr::constant(ConstValue::Float(1.0)),
        };

        Ok(Stmt::For {
            from,
            to,
            step,
            body,
            position,
        })
    }
}
