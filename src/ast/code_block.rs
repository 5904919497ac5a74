//! Code blocks and the variants of their entries.

use crate::arena::Deferred;
use crate::ast::{
    Assignment, Entity, Initialization, PostfixEntity, PostOperatorStatement,
    PreOperatorStatement, Statement,
};

/// Either form of entity invocation.
#[derive(Clone, Debug, Default)]
pub enum AnyEntity<'src> {
    #[default]
    Undefined,
    Plain(Deferred<Entity<'src>>),
    Postfix(Deferred<PostfixEntity<'src>>),
}

/// Any statement-shaped construct: pre/post operator statements,
/// invocations, and initializations (which read like assignments but
/// compile as constructor statements).
#[derive(Clone, Debug, Default)]
pub enum AnyStatement<'src> {
    #[default]
    Undefined,
    PreOp(Deferred<PreOperatorStatement<'src>>),
    PostOp(Deferred<PostOperatorStatement<'src>>),
    Statement(Deferred<Statement<'src>>),
    Initialization(Deferred<Initialization<'src>>),
}

/// One entry of a code block.
#[derive(Clone, Debug, Default)]
pub enum CodeBlockEntry<'src> {
    #[default]
    Undefined,
    Entity(AnyEntity<'src>),
    Assignment(Deferred<Assignment<'src>>),
    Statement(AnyStatement<'src>),
    /// A nested anonymous scope.
    Inner(Deferred<CodeBlock<'src>>),
}

/// A block of code: its entries in declaration order.
#[derive(Clone, Debug, Default)]
pub struct CodeBlock<'src> {
    pub entries: Vec<Deferred<CodeBlockEntry<'src>>>,
}
