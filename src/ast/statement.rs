//! Statements: invocations plus pre/post operator forms.

use crate::arena::Deferred;
use crate::ast::{Expression, Ident, IdentList, TemplateArgumentList};

/// A regular statement is an identifier plus parameter expressions; this
/// is the Epoch function call syntax.
#[derive(Clone, Debug, Default)]
pub struct Statement<'src> {
    pub identifier: Ident<'src>,
    pub template_args: Option<TemplateArgumentList<'src>>,
    pub params: Vec<Deferred<Expression<'src>>>,
}

/// An operator applied before its operand, e.g. `++counter`. The operand
/// is an identifier list because it may be a member access chain.
#[derive(Clone, Debug, Default)]
pub struct PreOperatorStatement<'src> {
    pub operator: Ident<'src>,
    pub operand: Deferred<IdentList<'src>>,
}

/// An operator applied after its operand, e.g. `counter++`.
#[derive(Clone, Debug, Default)]
pub struct PostOperatorStatement<'src> {
    pub operand: Deferred<IdentList<'src>>,
    pub operator: Ident<'src>,
}
