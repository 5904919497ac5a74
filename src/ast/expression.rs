//! Expressions and their constituent parts.
//!
//! An expression is a leading component followed by fragments, each
//! fragment pairing an infix operator with the component to its right.
//! Precedence is not resolved here; the lowering pass emits the atoms in
//! source order and later phases deal with operator binding.

use crate::arena::Deferred;
use crate::ast::{
    Ident, IdentList, LiteralToken, PostOperatorStatement, PreOperatorStatement, Statement,
};

/// A parenthesized term: a pre/post operator statement or a full nested
/// expression.
#[derive(Clone, Debug, Default)]
pub enum Parenthetical<'src> {
    #[default]
    Undefined,
    PreOp(Deferred<PreOperatorStatement<'src>>),
    PostOp(Deferred<PostOperatorStatement<'src>>),
    Expression(Deferred<Expression<'src>>),
}

/// The payload of an expression component.
#[derive(Clone, Debug, Default)]
pub enum ComponentInner<'src> {
    #[default]
    Undefined,
    Identifier(Ident<'src>),
    Literal(LiteralToken<'src>),
    Statement(Deferred<Statement<'src>>),
    Parenthetical(Parenthetical<'src>),
}

/// One term of an expression: optional unary prefixes applied to an inner
/// payload.
#[derive(Clone, Debug, Default)]
pub struct ExpressionComponent<'src> {
    pub unary_prefixes: Deferred<IdentList<'src>>,
    pub inner: ComponentInner<'src>,
}

/// An infix operator joined with the component on its right-hand side.
#[derive(Clone, Debug, Default)]
pub struct ExpressionFragment<'src> {
    pub operator: Ident<'src>,
    pub component: Deferred<ExpressionComponent<'src>>,
}

/// A component followed by zero or more fragments.
#[derive(Clone, Debug, Default)]
pub struct Expression<'src> {
    pub first: Deferred<ExpressionComponent<'src>>,
    pub remaining: Vec<Deferred<ExpressionFragment<'src>>>,
}
