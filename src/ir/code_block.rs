//! IR code blocks.

use crate::errors::SourceSite;
use crate::ir::{
    IrAssignment, IrEntity, IrExpression, IrPostOpStatement, IrPreOpStatement, IrStatement,
    ScopeRef, TypeId, VariableOrigin,
};
use crate::pool::StringHandle;

/// A lowered variable initialization: `Point p = (1, 2)` becomes the
/// interned type name, the variable, and the constructor arguments.
#[derive(Clone, Debug)]
pub struct IrInitialization {
    pub type_name: StringHandle,
    pub variable: StringHandle,
    pub arguments: Vec<IrExpression>,
    pub site: Option<SourceSite>,
}

impl IrInitialization {
    pub fn new(type_name: StringHandle, variable: StringHandle) -> Self {
        IrInitialization {
            type_name,
            variable,
            arguments: Vec::new(),
            site: None,
        }
    }
}

/// One entry of a lowered code block.
#[derive(Clone, Debug)]
pub enum IrCodeBlockEntry {
    Statement(IrStatement),
    PreOp(IrPreOpStatement),
    PostOp(IrPostOpStatement),
    Assignment(IrAssignment),
    Entity(IrEntity),
    Inner(IrCodeBlock),
    Initialization(IrInitialization),
}

/// A lowered code block: its scope plus entries in source order.
///
/// Most blocks own a fresh scope parented on their surroundings; blocks
/// lowered directly under the program borrow the global scope instead,
/// which the program owns.
#[derive(Clone, Debug)]
pub struct IrCodeBlock {
    scope: ScopeRef,
    owns_scope: bool,
    /// Stable name assigned by the program for codegen bookkeeping.
    pub scope_name: StringHandle,
    pub entries: Vec<IrCodeBlockEntry>,
}

impl IrCodeBlock {
    pub fn new(scope: ScopeRef, owns_scope: bool) -> Self {
        IrCodeBlock {
            scope,
            owns_scope,
            scope_name: StringHandle::NULL,
            entries: Vec::new(),
        }
    }

    pub fn scope(&self) -> ScopeRef {
        self.scope.clone()
    }

    pub fn owns_scope(&self) -> bool {
        self.owns_scope
    }

    pub fn add_entry(&mut self, entry: IrCodeBlockEntry) {
        self.entries.push(entry);
    }

    pub fn add_variable(
        &self,
        name: StringHandle,
        ty: TypeId,
        is_reference: bool,
        origin: VariableOrigin,
    ) {
        self.scope
            .borrow_mut()
            .add_variable(name, ty, is_reference, origin);
    }
}
