//! IR assignments, including chained assignment right-hand sides.

use crate::ir::IrExpression;
use crate::pool::StringHandle;

/// The right-hand side of an assignment: a terminal expression or the
/// next link of an assignment chain (`a = b = 42`).
#[derive(Clone, Debug)]
pub enum AssignmentChain {
    Expression(IrExpression),
    Assignment(Box<IrAssignment>),
}

/// A lowered assignment. The left-hand side keeps the full member access
/// chain; the operator may be compound (`+=`).
#[derive(Clone, Debug)]
pub struct IrAssignment {
    pub lhs: Vec<StringHandle>,
    pub operator: StringHandle,
    pub rhs: Option<AssignmentChain>,
}

impl IrAssignment {
    pub fn new(operator: StringHandle) -> Self {
        IrAssignment {
            lhs: Vec::new(),
            operator,
            rhs: None,
        }
    }

    /// Install the right-hand side, descending into an already-attached
    /// chain so the innermost open assignment receives the value.
    pub fn set_rhs(&mut self, chain: AssignmentChain) {
        match &mut self.rhs {
            Some(AssignmentChain::Assignment(inner)) => inner.set_rhs(chain),
            _ => self.rhs = Some(chain),
        }
    }
}
