//! Diagnostics for the semantic pass.
//!
//! Two families of failure exist. Recoverable problems (bad types,
//! unresolvable overloads, unknown tags, malformed literals) are appended
//! to a [`CompileErrors`] buffer while the pass keeps walking; the phase
//! that produced them reports failure at its boundary. Truly fatal
//! conditions (traverser contract violations, re-entrant ASTs, known
//! unimplemented constructs, exhausted backing memory) abort the pass
//! immediately as a [`Fatal`] value.

use std::{error::Error, fmt::Display};

use serde::{Deserialize, Serialize};

/// Flat taxonomy of everything the front end can complain about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The traverser or the pass detected an inconsistency in itself.
    InternalError,
    /// A program node was visited while another lowering was in flight.
    ReentrantAst,
    /// A construct the parser can produce but the pass does not implement.
    UnsupportedFeature,
    /// Type inference or validation rejected a site.
    TypeError,
    /// Overload resolution failed or was ambiguous.
    OverloadError,
    /// A function tag or entity name has no registry entry.
    UnknownTag,
    /// An identifier looked like a literal but failed to parse.
    LiteralParseError,
    /// The host refused backing memory for the AST arena.
    ArenaExhausted,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ErrorKind::InternalError => "internal error",
            ErrorKind::ReentrantAst => "re-entrant AST",
            ErrorKind::UnsupportedFeature => "unsupported feature",
            ErrorKind::TypeError => "type error",
            ErrorKind::OverloadError => "overload error",
            ErrorKind::UnknownTag => "unknown tag",
            ErrorKind::LiteralParseError => "literal parse error",
            ErrorKind::ArenaExhausted => "arena exhausted",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// A rendered source location: enough to print `source:line:col`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSite {
    pub source: String,
    pub line: usize,
    pub column: usize,
}

impl Display for SourceSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}:{}:{}", self.source, self.line, self.column))
    }
}

/// One buffered diagnostic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompileError {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub message: String,
    pub site: Option<SourceSite>,
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.site {
            Some(site) => f.write_fmt(format_args!("{}: {}", site, self.message)),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for CompileError {}

/// Ordered buffer of diagnostics produced by one pass.
///
/// The pass updates the buffer's context whenever it visits an
/// identifier; errors raised afterwards inherit that location until the
/// context changes again.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompileErrors {
    entries: Vec<CompileError>,
    #[serde(skip)]
    context: Option<SourceSite>,
}

impl CompileErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the location attached to subsequently raised diagnostics.
    pub fn set_context(&mut self, site: SourceSite) {
        self.context = Some(site);
    }

    pub fn clear_context(&mut self) {
        self.context = None;
    }

    pub fn error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.push(Severity::Error, kind, message);
    }

    pub fn warning(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.push(Severity::Warning, kind, message);
    }

    pub fn push(&mut self, severity: Severity, kind: ErrorKind, message: impl Into<String>) {
        self.entries.push(CompileError {
            severity,
            kind,
            message: message.into(),
            site: self.context.clone(),
        });
    }

    pub fn entries(&self) -> &[CompileError] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry is of error severity (warnings alone do not fail
    /// a phase).
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.severity == Severity::Error)
            .count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompileError> {
        self.entries.iter()
    }
}

impl Display for CompileErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// A condition that aborts the pass without producing an IR.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fatal {
    pub kind: ErrorKind,
    pub message: String,
}

impl Fatal {
    pub fn internal(message: impl Into<String>) -> Self {
        Fatal {
            kind: ErrorKind::InternalError,
            message: message.into(),
        }
    }

    pub fn reentrant() -> Self {
        Fatal {
            kind: ErrorKind::ReentrantAst,
            message: "re-entrant AST detected; merge tree fragments before validation".into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Fatal {
            kind: ErrorKind::UnsupportedFeature,
            message: message.into(),
        }
    }

    pub fn arena_exhausted() -> Self {
        Fatal {
            kind: ErrorKind::ArenaExhausted,
            message: "backing memory for the AST arena was refused".into(),
        }
    }
}

impl Display for Fatal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}: {}", self.kind, self.message))
    }
}

impl Error for Fatal {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_with_their_site() {
        let mut errors = CompileErrors::new();
        errors.set_context(SourceSite {
            source: "demo.epoch".into(),
            line: 3,
            column: 14,
        });
        errors.error(ErrorKind::TypeError, "mismatched operand");

        assert_eq!(
            errors.entries()[0].to_string(),
            "demo.epoch:3:14: mismatched operand"
        );
    }

    #[test]
    fn errors_without_context_render_bare() {
        let mut errors = CompileErrors::new();
        errors.error(ErrorKind::OverloadError, "no matching overload");

        assert_eq!(errors.entries()[0].to_string(), "no matching overload");
    }

    #[test]
    fn warnings_do_not_fail_a_phase() {
        let mut errors = CompileErrors::new();
        errors.warning(ErrorKind::TypeError, "suspicious narrowing");

        assert!(!errors.has_errors());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn fatal_formats_kind_and_message() {
        let fatal = Fatal::internal("unrecognized AST node type");
        assert_eq!(
            fatal.to_string(),
            "internal error: unrecognized AST node type"
        );
    }
}
