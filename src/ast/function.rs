//! Function definitions, tags, and return forms.

use crate::arena::Deferred;
use crate::ast::{
    CodeBlock, Expression, FunctionParameter, Ident, Initialization, LiteralToken,
};

/// Metadata attached to a function definition, e.g. `external` to defer
/// the implementation to a native library.
#[derive(Clone, Debug, Default)]
pub struct FunctionTag<'src> {
    pub name: Ident<'src>,
    pub parameters: Vec<LiteralToken<'src>>,
}

/// The return slot of a function: absent (void), a plain expression, or a
/// variable initialization that doubles as the return value definition.
#[derive(Clone, Debug, Default)]
pub enum FunctionReturn<'src> {
    #[default]
    Undefined,
    Expression(Deferred<Expression<'src>>),
    Initialization(Deferred<Initialization<'src>>),
}

/// A function definition: name, ordered parameters, optional return,
/// optional tag list, optional body.
#[derive(Clone, Debug, Default)]
pub struct Function<'src> {
    pub name: Ident<'src>,
    pub parameters: Vec<Deferred<FunctionParameter<'src>>>,
    pub return_value: FunctionReturn<'src>,
    pub tags: Option<Vec<FunctionTag<'src>>>,
    pub code: Option<Deferred<CodeBlock<'src>>>,
}
