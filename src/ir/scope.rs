//! Lexical scope descriptions.

use std::{cell::RefCell, rc::Rc};

use crate::ir::TypeId;
use crate::pool::StringHandle;

/// Where a variable came from; codegen treats the origins differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableOrigin {
    Local,
    Parameter,
    Return,
    Global,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeVariable {
    pub name: StringHandle,
    pub ty: TypeId,
    pub is_reference: bool,
    pub origin: VariableOrigin,
}

/// Shared handle to a scope. Blocks own their scope through one of these;
/// children hold an additional handle to their parent, pointing upward
/// only, so the graph stays acyclic and dropping a child never touches
/// the parent.
pub type ScopeRef = Rc<RefCell<ScopeDescription>>;

/// An ordered variable table with a parent link.
///
/// Insertion order is preserved so that later codegen sees variables in a
/// stable order.
#[derive(Clone, Debug, Default)]
pub struct ScopeDescription {
    parent: Option<ScopeRef>,
    variables: Vec<ScopeVariable>,
}

impl ScopeDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: ScopeRef) -> Self {
        ScopeDescription {
            parent: Some(parent),
            variables: Vec::new(),
        }
    }

    pub fn into_ref(self) -> ScopeRef {
        Rc::new(RefCell::new(self))
    }

    pub fn parent(&self) -> Option<ScopeRef> {
        self.parent.clone()
    }

    pub fn add_variable(
        &mut self,
        name: StringHandle,
        ty: TypeId,
        is_reference: bool,
        origin: VariableOrigin,
    ) {
        self.variables.push(ScopeVariable {
            name,
            ty,
            is_reference,
            origin,
        });
    }

    pub fn variables(&self) -> &[ScopeVariable] {
        &self.variables
    }

    /// Whether `name` is bound in this scope alone.
    pub fn contains_local(&self, name: StringHandle) -> bool {
        self.variables.iter().any(|variable| variable.name == name)
    }

    /// Resolve `name`, walking the parent chain outward.
    pub fn find(&self, name: StringHandle) -> Option<ScopeVariable> {
        if let Some(variable) = self
            .variables
            .iter()
            .rev()
            .find(|variable| variable.name == name)
        {
            return Some(*variable);
        }

        self.parent
            .as_ref()
            .and_then(|parent| parent.borrow().find(name))
    }

    pub fn contains(&self, name: StringHandle) -> bool {
        self.find(name).is_some()
    }
}
