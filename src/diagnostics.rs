//! Diagnostics for source registration and builds.
//!
//! Every problem found while compiling a set of sources is recorded as a
//! [`Diagnostic`] carrying its [`ErrorKind`], a stable code and the
//! [`StatementRef`] of the responsible statement. Builds accumulate them
//! in a [`DiagnosticCollector`] and surface them once.

use std::fmt;
use std::sync::Arc;

use crate::base::StatementRef;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Severity {
    Error,
    Warning,
}

/// The error taxonomy of a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorKind {
    /// Conflicting sources claiming one identifier.
    Registration,
    /// Malformed statement text.
    Syntax,
    /// Unresolved import/include/belongs-to, prefix problems.
    Linkage,
    /// A deferred action whose prerequisites were never met.
    InferenceStall,
    /// Two different values bound under one namespace key.
    Collision,
    /// Illegal statement, inconsistent constraint, illegal rewrite target.
    Constraint,
}

impl ErrorKind {
    pub fn display(self) -> &'static str {
        match self {
            ErrorKind::Registration => "registration",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Linkage => "linkage",
            ErrorKind::InferenceStall => "inference",
            ErrorKind::Collision => "collision",
            ErrorKind::Constraint => "constraint",
        }
    }
}

/// A diagnostic message with its source reference.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    /// Stable code (e.g. "E0004"), see [`codes`].
    pub code: &'static str,
    pub message: Arc<str>,
    /// The responsible statement, when there is one.
    pub reference: Option<StatementRef>,
    /// Other statements involved (previous definition, cycle members...).
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RelatedInfo {
    pub reference: StatementRef,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(
        kind: ErrorKind,
        code: &'static str,
        reference: Option<StatementRef>,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            code,
            message: message.into(),
            reference,
            related: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(
        kind: ErrorKind,
        code: &'static str,
        reference: Option<StatementRef>,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, code, reference, message)
        }
    }

    /// Add related information.
    pub fn with_related(mut self, reference: StatementRef, message: impl Into<Arc<str>>) -> Self {
        self.related.push(RelatedInfo {
            reference,
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}[{}]", self.code)?;
        if let Some(reference) = &self.reference {
            write!(f, " {reference}")?;
        }
        write!(f, ": {}", self.message)?;
        for related in &self.related {
            write!(f, "\n  note: {} ({})", related.message, related.reference)?;
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Stable diagnostic codes.
pub mod codes {
    /// Reference whose target never appeared.
    pub const UNRESOLVED_REFERENCE: &str = "E0001";
    /// Duplicate definition under one namespace key.
    pub const DUPLICATE_DEFINITION: &str = "E0004";
    /// Circular dependency (imports, groupings, typedefs).
    pub const CIRCULAR_DEPENDENCY: &str = "E0007";

    /// Two different sources registered under one identifier.
    pub const SOURCE_CONFLICT: &str = "E0101";
    /// Malformed source text.
    pub const SYNTAX: &str = "E0102";
    /// Import/include/belongs-to target not available.
    pub const MISSING_DEPENDENCY: &str = "E0103";
    /// Prefix bound twice in one source.
    pub const PREFIX_COLLISION: &str = "E0104";
    /// Argument text that does not parse for its statement.
    pub const INVALID_ARGUMENT: &str = "E0105";
    /// Statement not legal for the declared language version.
    pub const VERSION_MISMATCH: &str = "E0106";
    /// min-elements greater than max-elements.
    pub const ELEMENT_RANGE: &str = "E0107";
    /// `current` definition referencing a deprecated/obsolete one.
    pub const STATUS_MISMATCH: &str = "E0108";
    /// Illegal target for augment, refine or deviate.
    pub const ILLEGAL_TARGET: &str = "E0109";
    /// Substatement appearing more often than allowed.
    pub const CARDINALITY: &str = "E0110";
    /// Deviation that cannot be applied to its target.
    pub const INVALID_DEVIATION: &str = "E0111";
    /// Statement placed under a parent that does not allow it.
    pub const ILLEGAL_SUBSTATEMENT: &str = "E0112";
    /// `range`, `length` or `pattern` that does not fit its type.
    pub const INVALID_RESTRICTION: &str = "E0113";

    /// Deviation skipped because the deviating module is not permitted.
    pub const IGNORED_DEVIATION: &str = "W0101";
    /// `deviate delete` of a statement the target does not have.
    pub const NOTHING_TO_DELETE: &str = "W0102";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during a build.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an error.
    pub fn error(
        &mut self,
        kind: ErrorKind,
        code: &'static str,
        reference: &StatementRef,
        message: impl Into<Arc<str>>,
    ) {
        self.add(Diagnostic::error(kind, code, Some(reference.clone()), message));
    }

    /// Add a duplicate definition error naming both statements.
    pub fn duplicate_definition(
        &mut self,
        what: &str,
        name: &str,
        duplicate: &StatementRef,
        existing: &StatementRef,
    ) {
        self.add(
            Diagnostic::error(
                ErrorKind::Collision,
                codes::DUPLICATE_DEFINITION,
                Some(duplicate.clone()),
                format!("duplicate {what} '{name}'"),
            )
            .with_related(existing.clone(), format!("previous definition of '{name}'")),
        );
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl Extend<Diagnostic> for DiagnosticCollector {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.diagnostics.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{LineCol, TextRange, TextSize};

    fn make_ref(source: &str, line: u32) -> StatementRef {
        StatementRef::new(
            Arc::from(source),
            TextRange::empty(TextSize::from(0)),
            LineCol::new(line, 2),
        )
    }

    #[test]
    fn test_duplicate_definition_names_both_statements() {
        let mut collector = DiagnosticCollector::new();
        collector.duplicate_definition("typedef", "t", &make_ref("a.yang", 5), &make_ref("a.yang", 2));

        let diag = &collector.diagnostics()[0];
        assert_eq!(diag.kind, ErrorKind::Collision);
        assert_eq!(diag.code, codes::DUPLICATE_DEFINITION);
        assert_eq!(diag.reference.as_ref().map(|r| r.position.line), Some(5));
        assert_eq!(diag.related.len(), 1);
        assert_eq!(diag.related[0].reference.position.line, 2);
    }

    #[test]
    fn test_collector_counts_only_errors() {
        let mut collector = DiagnosticCollector::new();
        collector.add(Diagnostic::warning(
            ErrorKind::Constraint,
            codes::NOTHING_TO_DELETE,
            None,
            "nothing",
        ));
        assert!(!collector.has_errors());

        collector.error(ErrorKind::Linkage, codes::MISSING_DEPENDENCY, &make_ref("b.yang", 0), "missing");
        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.take().len(), 2);
        assert!(collector.diagnostics().is_empty());
    }

    #[test]
    fn test_display_includes_code_location_and_notes() {
        let diag = Diagnostic::error(
            ErrorKind::Collision,
            codes::DUPLICATE_DEFINITION,
            Some(make_ref("a.yang", 0)),
            "duplicate typedef 't'",
        )
        .with_related(make_ref("a.yang", 3), "previous definition of 't'");

        let text = diag.to_string();
        assert!(text.starts_with("error[E0004] a.yang:1:3: duplicate typedef 't'"));
        assert!(text.contains("note: previous definition of 't' (a.yang:4:3)"));
    }
}
