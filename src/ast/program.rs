//! The AST root: a program is an ordered sequence of meta-entities.

use crate::arena::Deferred;
use crate::ast::{CodeBlock, Function, Structure};

/// Any top-level construct in an Epoch program.
#[derive(Clone, Debug, Default)]
pub enum MetaEntity<'src> {
    /// Placeholder left behind by a failed parse alternative. Legal only
    /// in trees that were never fully parsed.
    #[default]
    Undefined,
    Structure(Deferred<Structure<'src>>),
    Global(Deferred<CodeBlock<'src>>),
    Function(Deferred<Function<'src>>),
}

/// A complete parsed compilation unit. A program with no meta-entities is
/// legal (the empty program).
#[derive(Clone, Debug, Default)]
pub struct Program<'src> {
    pub meta_entities: Vec<MetaEntity<'src>>,
}

impl<'src> Program<'src> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: MetaEntity<'src>) {
        self.meta_entities.push(entity);
    }
}
