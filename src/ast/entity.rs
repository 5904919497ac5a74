//! Entity invocations.
//!
//! Entities extend flow control: `if`, `while` and their kin are not
//! keywords baked into this stage but named constructs with parameter
//! expressions, a body, and optionally a chain of subordinate entities
//! (`elseif`/`else`) or a postfix closer (`do`/`while`).

use crate::arena::Deferred;
use crate::ast::{CodeBlock, Expression, Ident};

/// A subordinate entity attached to the chain of an outer entity. Chains
/// may repeat arbitrarily and end with an optional terminator.
#[derive(Clone, Debug, Default)]
pub struct ChainedEntity<'src> {
    pub identifier: Ident<'src>,
    pub parameters: Vec<Deferred<Expression<'src>>>,
    pub code: Deferred<CodeBlock<'src>>,
}

/// A standard entity invocation: parameters first, then the body, then
/// any chained entities in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Entity<'src> {
    pub identifier: Ident<'src>,
    pub parameters: Vec<Deferred<Expression<'src>>>,
    pub code: Deferred<CodeBlock<'src>>,
    pub chain: Vec<Deferred<ChainedEntity<'src>>>,
}

/// An entity whose identifier and parameters follow the body, as in
/// do/while loops.
#[derive(Clone, Debug, Default)]
pub struct PostfixEntity<'src> {
    pub identifier: Ident<'src>,
    pub parameters: Vec<Deferred<Expression<'src>>>,
    pub code: Deferred<CodeBlock<'src>>,
    pub postfix_identifier: Ident<'src>,
    pub postfix_parameters: Vec<Deferred<Expression<'src>>>,
}
