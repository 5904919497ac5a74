//! IR statements and the pre/post operator forms.

use std::cell::Cell;

use crate::errors::SourceSite;
use crate::ir::{IrExpression, TypeId};
use crate::pool::StringHandle;

/// A lowered statement: interned name, argument expressions, and the
/// return type picked during overload resolution.
#[derive(Clone, Debug)]
pub struct IrStatement {
    pub name: StringHandle,
    pub arguments: Vec<IrExpression>,
    /// Location of the statement identifier, for phase diagnostics.
    pub site: Option<SourceSite>,
    return_ty: Cell<TypeId>,
    resolved_overload: Cell<Option<StringHandle>>,
}

impl IrStatement {
    pub fn new(name: StringHandle) -> Self {
        IrStatement {
            name,
            arguments: Vec::new(),
            site: None,
            return_ty: Cell::new(TypeId::Infer),
            resolved_overload: Cell::new(None),
        }
    }

    pub fn add_parameter(&mut self, expression: IrExpression) {
        self.arguments.push(expression);
    }

    pub fn return_ty(&self) -> TypeId {
        self.return_ty.get()
    }

    pub fn set_return_ty(&self, ty: TypeId) {
        self.return_ty.set(ty);
    }

    /// The overload the inference phase settled on, if any.
    pub fn resolved_overload(&self) -> Option<StringHandle> {
        self.resolved_overload.get()
    }

    pub fn set_resolved_overload(&self, overload: StringHandle) {
        self.resolved_overload.set(Some(overload));
    }
}

/// `++i` and friends: operator first, then a member access chain.
#[derive(Clone, Debug)]
pub struct IrPreOpStatement {
    pub operator: StringHandle,
    pub operand: Vec<StringHandle>,
    ty: Cell<TypeId>,
}

impl IrPreOpStatement {
    pub fn new(operator: StringHandle) -> Self {
        IrPreOpStatement {
            operator,
            operand: Vec::new(),
            ty: Cell::new(TypeId::Infer),
        }
    }

    pub fn ty(&self) -> TypeId {
        self.ty.get()
    }

    pub fn set_ty(&self, ty: TypeId) {
        self.ty.set(ty);
    }
}

/// `i++` and friends: member access chain first, then the operator.
#[derive(Clone, Debug)]
pub struct IrPostOpStatement {
    pub operand: Vec<StringHandle>,
    pub operator: StringHandle,
    ty: Cell<TypeId>,
}

impl IrPostOpStatement {
    pub fn new(operator: StringHandle) -> Self {
        IrPostOpStatement {
            operand: Vec::new(),
            operator,
            ty: Cell::new(TypeId::Infer),
        }
    }

    pub fn ty(&self) -> TypeId {
        self.ty.get()
    }

    pub fn set_ty(&self, ty: TypeId) {
        self.ty.set(ty);
    }
}
