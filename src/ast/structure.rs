//! Structure definitions and their members.

use crate::arena::Deferred;
use crate::ast::{Ident, IdentList, TemplateArgumentList, TemplateParameterList};

/// A plain member variable: type, optional template arguments, name.
#[derive(Clone, Debug, Default)]
pub struct StructureMemberVariable<'src> {
    pub type_name: Ident<'src>,
    pub template_args: Option<TemplateArgumentList<'src>>,
    pub name: Ident<'src>,
}

/// A member that references a function with the given signature; this is
/// how structures hold callable slots.
#[derive(Clone, Debug, Default)]
pub struct StructureMemberFunctionRef<'src> {
    pub name: Ident<'src>,
    pub param_types: Deferred<IdentList<'src>>,
    /// Omitted for signatures with no return value.
    pub return_type: Option<Ident<'src>>,
}

#[derive(Clone, Debug)]
pub enum StructureMember<'src> {
    Variable(StructureMemberVariable<'src>),
    FunctionRef(StructureMemberFunctionRef<'src>),
}

/// A complete structure definition. Members keep declaration order.
#[derive(Clone, Debug, Default)]
pub struct Structure<'src> {
    pub identifier: Ident<'src>,
    pub template_params: Option<TemplateParameterList<'src>>,
    pub members: Vec<StructureMember<'src>>,
}
