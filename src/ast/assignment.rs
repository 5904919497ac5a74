//! Assignments, chained assignments, and initializations.

use crate::arena::Deferred;
use crate::ast::{Expression, Ident, IdentList, TemplateArgumentList};

/// Right-hand side of an assignment: a terminal expression (`foo = 42`)
/// or a nested assignment (`foo = bar = 42`).
#[derive(Clone, Debug, Default)]
pub enum ExpressionOrAssignment<'src> {
    #[default]
    Undefined,
    Expression(Deferred<Expression<'src>>),
    Assignment(Deferred<Assignment<'src>>),
}

/// An assignment. The left-hand side is an identifier list so that
/// member access chains (`point.x`) can be targets; the operator may be a
/// compound form such as `+=`.
#[derive(Clone, Debug, Default)]
pub struct Assignment<'src> {
    pub lhs: Deferred<IdentList<'src>>,
    pub operator: Ident<'src>,
    pub rhs: ExpressionOrAssignment<'src>,
}

/// A variable initialization: type specifier, variable name, and the
/// constructor-call arguments. Initializations look like assignments in
/// the syntax but compile as constructor statements.
#[derive(Clone, Debug, Default)]
pub struct Initialization<'src> {
    pub type_specifier: Ident<'src>,
    pub template_args: Option<TemplateArgumentList<'src>>,
    pub lhs: Ident<'src>,
    pub rhs: Vec<Deferred<Expression<'src>>>,
}
