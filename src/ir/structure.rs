//! IR structures.

use crate::ir::TypeId;
use crate::pool::StringHandle;

/// A plain member variable, keyed by its interned type name.
#[derive(Clone, Debug)]
pub struct IrStructureMemberVariable {
    pub type_name: StringHandle,
}

/// A member that references a function with the given signature.
#[derive(Clone, Debug)]
pub struct IrStructureMemberFuncRef {
    pub param_types: Vec<StringHandle>,
    pub return_type: Option<StringHandle>,
}

#[derive(Clone, Debug)]
pub enum IrStructureMember {
    Variable(IrStructureMemberVariable),
    FunctionReference(IrStructureMemberFuncRef),
}

impl IrStructureMember {
    /// The member's type, resolved against a type table lookup function.
    pub fn type_id(&self, lookup: impl Fn(StringHandle) -> TypeId) -> TypeId {
        match self {
            IrStructureMember::Variable(variable) => lookup(variable.type_name),
            IrStructureMember::FunctionReference(_) => TypeId::Function,
        }
    }
}

/// A lowered structure definition: (name, member) pairs in declaration
/// order.
#[derive(Clone, Debug, Default)]
pub struct IrStructure {
    members: Vec<(StringHandle, IrStructureMember)>,
}

impl IrStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&mut self, name: StringHandle, member: IrStructureMember) {
        self.members.push((name, member));
    }

    pub fn members(&self) -> &[(StringHandle, IrStructureMember)] {
        &self.members
    }

    pub fn member(&self, name: StringHandle) -> Option<&IrStructureMember> {
        self.members
            .iter()
            .find(|(member_name, _)| *member_name == name)
            .map(|(_, member)| member)
    }
}
