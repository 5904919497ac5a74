//! Generic-programming metadata carried on declarations.
//!
//! Template parameters and arguments are parsed and preserved but not
//! instantiated by this stage of the toolchain.

use crate::ast::{Ident, LiteralToken};

#[derive(Clone, Copy, Debug)]
pub struct TemplateParameter<'src> {
    pub type_name: Ident<'src>,
    pub name: Ident<'src>,
}

#[derive(Clone, Copy, Debug)]
pub enum TemplateArgument<'src> {
    Identifier(Ident<'src>),
    Literal(LiteralToken<'src>),
}

pub type TemplateParameterList<'src> = Vec<TemplateParameter<'src>>;
pub type TemplateArgumentList<'src> = Vec<TemplateArgument<'src>>;
