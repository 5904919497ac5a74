//! IR expressions as flat atom sequences.
//!
//! Lowering serializes each source expression into a linear list of
//! atoms in source order; the later codegen consumes this form directly
//! instead of re-walking a tree. Types are written into `Cell` slots by
//! the inference phase so the walk itself stays immutable.

use std::cell::Cell;

use crate::ir::{IrPostOpStatement, IrPreOpStatement, IrStatement, TypeId};
use crate::pool::StringHandle;

/// A parenthesized term carried as a single atom.
#[derive(Clone, Debug)]
pub enum IrParenthetical {
    PreOp(Box<IrPreOpStatement>),
    PostOp(Box<IrPostOpStatement>),
    Expression(Box<IrExpression>),
}

/// One element of a lowered expression.
#[derive(Clone, Debug)]
pub enum ExpressionAtom {
    Identifier {
        name: StringHandle,
        ty: Cell<TypeId>,
    },
    /// An identifier that must bind by reference rather than value.
    IdentifierReference {
        name: StringHandle,
        ty: Cell<TypeId>,
    },
    Operator {
        name: StringHandle,
        /// Set for the `.` operator; member accesses resolve against
        /// structure layouts instead of the operator overload table.
        member_access: bool,
    },
    LiteralInteger(i32),
    LiteralReal(f32),
    LiteralBoolean(bool),
    LiteralString(StringHandle),
    Statement(Box<IrStatement>),
    Parenthetical(IrParenthetical),
    /// Codegen-era atom: copy a member out of a structure value.
    CopyFromStructure {
        structure: StringHandle,
        member: StringHandle,
    },
    /// Codegen-era atom: bind a structure member as a reference.
    BindReference {
        name: StringHandle,
        structure: StringHandle,
        is_reference: bool,
        override_input_as_ref: bool,
    },
    /// Codegen-era atom: a type annotation injected between atoms.
    TypeAnnotation(TypeId),
    /// Codegen-era atom: materialize a temporary reference from the
    /// active register.
    TempReferenceFromRegister,
}

impl ExpressionAtom {
    pub fn identifier(name: StringHandle) -> Self {
        ExpressionAtom::Identifier {
            name,
            ty: Cell::new(TypeId::Infer),
        }
    }

    pub fn operator(name: StringHandle, member_access: bool) -> Self {
        ExpressionAtom::Operator {
            name,
            member_access,
        }
    }

    /// The identifier handle if this atom is a plain identifier.
    pub fn as_identifier(&self) -> Option<StringHandle> {
        match self {
            ExpressionAtom::Identifier { name, .. }
            | ExpressionAtom::IdentifierReference { name, .. } => Some(*name),
            _ => None,
        }
    }
}

/// A lowered expression: its atoms plus the inferred result type.
#[derive(Clone, Debug, Default)]
pub struct IrExpression {
    pub atoms: Vec<ExpressionAtom>,
    ty: Cell<TypeId>,
}

impl IrExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: ExpressionAtom) {
        self.atoms.push(atom);
    }

    pub fn ty(&self) -> TypeId {
        self.ty.get()
    }

    pub fn set_ty(&self, ty: TypeId) {
        self.ty.set(ty);
    }

    /// The handle of the sole identifier atom, if the expression is
    /// exactly one identifier. Constructor statements rely on this shape
    /// for their first argument.
    pub fn single_identifier(&self) -> Option<StringHandle> {
        match self.atoms.as_slice() {
            [atom] => atom.as_identifier(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_identifier_requires_exactly_one_atom() {
        let mut expression = IrExpression::new();
        expression.add_atom(ExpressionAtom::identifier(StringHandle::from_raw(4)));
        assert_eq!(
            expression.single_identifier(),
            Some(StringHandle::from_raw(4))
        );

        expression.add_atom(ExpressionAtom::LiteralInteger(1));
        assert_eq!(expression.single_identifier(), None);
    }

    #[test]
    fn literal_atoms_are_not_identifiers() {
        let mut expression = IrExpression::new();
        expression.add_atom(ExpressionAtom::LiteralBoolean(true));
        assert_eq!(expression.single_identifier(), None);
    }

    #[test]
    fn expression_type_slot_starts_unresolved() {
        let expression = IrExpression::new();
        assert_eq!(expression.ty(), TypeId::Infer);
        expression.set_ty(TypeId::Integer);
        assert_eq!(expression.ty(), TypeId::Integer);
    }
}
