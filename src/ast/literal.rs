//! Literal tokens.

/// A literal value as the parser captured it. String literals borrow the
/// source buffer just like identifiers do.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LiteralToken<'src> {
    /// Placeholder for a failed alternative during backtracking.
    #[default]
    Undefined,
    Integer(i32),
    UnsignedInteger(u32),
    Real(f32),
    Str(&'src str),
    Boolean(bool),
}

impl LiteralToken<'_> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, LiteralToken::Undefined)
    }
}
