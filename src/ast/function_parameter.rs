//! The parameter forms a function definition accepts.

use crate::arena::Deferred;
use crate::ast::{Expression, Ident, IdentList, TemplateArgumentList};

/// A named parameter binds directly to a local variable in the function's
/// scope.
#[derive(Clone, Debug, Default)]
pub struct NamedFunctionParameter<'src> {
    pub type_name: Ident<'src>,
    pub template_args: Option<TemplateArgumentList<'src>>,
    pub is_reference: bool,
    pub name: Ident<'src>,
}

/// Signature of a function passed by reference, used for higher-order
/// functions.
#[derive(Clone, Debug, Default)]
pub struct FunctionReferenceSignature<'src> {
    pub identifier: Ident<'src>,
    pub param_types: Deferred<IdentList<'src>>,
    pub return_type: Option<Ident<'src>>,
}

/// Any valid function parameter form.
///
/// The `Patterned` form carries an expression; this is how Epoch
/// expresses pattern-matched parameter values. `Nothing` is the dummy
/// placeholder type for functions that pattern-match on "no value".
#[derive(Clone, Debug, Default)]
pub enum FunctionParameter<'src> {
    Named(Deferred<NamedFunctionParameter<'src>>),
    Patterned(Deferred<Expression<'src>>),
    Signature(Deferred<FunctionReferenceSignature<'src>>),
    #[default]
    Nothing,
}
