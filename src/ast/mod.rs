//! AST node model for Epoch programs.
//!
//! The node family mirrors the grammar's semantic shape: a [`Program`] of
//! meta-entities, structures, functions with their parameter forms,
//! entity invocations (the user-extensible flow-control constructs), code
//! blocks, statements, assignments and expressions. Identifiers and
//! string literals borrow out of the source buffer and stay valid for its
//! lifetime.
//!
//! Nodes are stored in the [`Ast`] arena and connected through
//! [`Deferred`] handles; see [`crate::arena`] for the construction
//! discipline.

mod assignment;
mod code_block;
mod entity;
mod expression;
mod function;
mod function_parameter;
mod ident;
mod literal;
mod program;
mod statement;
mod structure;
mod templates;

pub use self::assignment::*;
pub use self::code_block::*;
pub use self::entity::*;
pub use self::expression::*;
pub use self::function::*;
pub use self::function_parameter::*;
pub use self::ident::*;
pub use self::literal::*;
pub use self::program::*;
pub use self::statement::*;
pub use self::structure::*;
pub use self::templates::*;

use crate::arena::{AstNode, Deferred, NodePool};

/// The arena behind one parsed compilation unit: one pool per node kind.
///
/// A single compilation owns its arena for the duration of lowering and
/// drops it whole afterwards.
#[derive(Debug, Default)]
pub struct Ast<'src> {
    pub structures: NodePool<Structure<'src>>,
    pub functions: NodePool<Function<'src>>,
    pub parameters: NodePool<FunctionParameter<'src>>,
    pub named_parameters: NodePool<NamedFunctionParameter<'src>>,
    pub signatures: NodePool<FunctionReferenceSignature<'src>>,
    pub code_blocks: NodePool<CodeBlock<'src>>,
    pub block_entries: NodePool<CodeBlockEntry<'src>>,
    pub entities: NodePool<Entity<'src>>,
    pub chained_entities: NodePool<ChainedEntity<'src>>,
    pub postfix_entities: NodePool<PostfixEntity<'src>>,
    pub statements: NodePool<Statement<'src>>,
    pub preop_statements: NodePool<PreOperatorStatement<'src>>,
    pub postop_statements: NodePool<PostOperatorStatement<'src>>,
    pub assignments: NodePool<Assignment<'src>>,
    pub initializations: NodePool<Initialization<'src>>,
    pub expressions: NodePool<Expression<'src>>,
    pub components: NodePool<ExpressionComponent<'src>>,
    pub fragments: NodePool<ExpressionFragment<'src>>,
    pub ident_lists: NodePool<IdentList<'src>>,
}

impl<'src> Ast<'src> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `node` in its pool and return a filled holder for it.
    pub fn add<T: AstNode<'src>>(&mut self, node: T) -> Deferred<T> {
        Deferred::new(T::pool_mut(self).alloc(node))
    }
}

macro_rules! pooled_node {
    ($ty:ident, $pool:ident) => {
        impl<'src> AstNode<'src> for $ty<'src> {
            fn pool<'ast>(ast: &'ast Ast<'src>) -> &'ast NodePool<Self> {
                &ast.$pool
            }

            fn pool_mut<'ast>(ast: &'ast mut Ast<'src>) -> &'ast mut NodePool<Self> {
                &mut ast.$pool
            }
        }
    };
}

pooled_node!(Structure, structures);
pooled_node!(Function, functions);
pooled_node!(FunctionParameter, parameters);
pooled_node!(NamedFunctionParameter, named_parameters);
pooled_node!(FunctionReferenceSignature, signatures);
pooled_node!(CodeBlock, code_blocks);
pooled_node!(CodeBlockEntry, block_entries);
pooled_node!(Entity, entities);
pooled_node!(ChainedEntity, chained_entities);
pooled_node!(PostfixEntity, postfix_entities);
pooled_node!(Statement, statements);
pooled_node!(PreOperatorStatement, preop_statements);
pooled_node!(PostOperatorStatement, postop_statements);
pooled_node!(Assignment, assignments);
pooled_node!(Initialization, initializations);
pooled_node!(Expression, expressions);
pooled_node!(ExpressionComponent, components);
pooled_node!(ExpressionFragment, fragments);
pooled_node!(IdentList, ident_lists);
