//! Type identities used throughout the IR.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::pool::StringHandle;

/// Identity of a type as the IR knows it.
///
/// `Infer` marks slots that type inference has not filled yet; `Error`
/// marks slots that failed to resolve. Validation accepts neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeId {
    Error,
    Infer,
    Void,
    /// The type of a bare identifier used as a binding site, e.g. the
    /// first argument of a constructor statement.
    Identifier,
    Integer,
    Real,
    Boolean,
    String,
    Function,
    /// A user-defined structure, keyed by its interned name.
    Structure(StringHandle),
}

impl TypeId {
    /// Whether the slot holds a usable type.
    pub fn is_concrete(self) -> bool {
        !matches!(self, TypeId::Error | TypeId::Infer)
    }
}

impl Default for TypeId {
    fn default() -> Self {
        TypeId::Infer
    }
}

impl Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeId::Error => f.write_str("<error>"),
            TypeId::Infer => f.write_str("<unresolved>"),
            TypeId::Void => f.write_str("void"),
            TypeId::Identifier => f.write_str("identifier"),
            TypeId::Integer => f.write_str("integer"),
            TypeId::Real => f.write_str("real"),
            TypeId::Boolean => f.write_str("boolean"),
            TypeId::String => f.write_str("string"),
            TypeId::Function => f.write_str("function"),
            TypeId::Structure(name) => f.write_fmt(format_args!("structure({name})")),
        }
    }
}
