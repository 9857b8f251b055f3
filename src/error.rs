//! Error types surfaced at the crate boundary.

use std::fmt;

use thiserror::Error;

use crate::diagnostics::{Diagnostic, ErrorKind};
use crate::parser::SyntaxError;
use crate::project::LoadError;
use crate::source::RegistryError;

/// A failed build: every diagnostic accumulated up to and including the
/// phase that failed.
#[derive(Debug, Clone, Error)]
#[error("{}", Summary(.diagnostics))]
pub struct BuildError {
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Error diagnostics of one kind.
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics
            .iter()
            .filter(move |d| d.is_error() && d.kind == kind)
    }

    /// Inference actions that never had their prerequisites met.
    pub fn unresolved(&self) -> Vec<&Diagnostic> {
        self.of_kind(ErrorKind::InferenceStall).collect()
    }

    /// Namespace collisions.
    pub fn collisions(&self) -> Vec<&Diagnostic> {
        self.of_kind(ErrorKind::Collision).collect()
    }

    /// Illegal statements, inconsistent constraints and rewrite targets.
    pub fn constraints(&self) -> Vec<&Diagnostic> {
        self.of_kind(ErrorKind::Constraint).collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// True if any diagnostic carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}

struct Summary<'a>(&'a [Diagnostic]);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors: Vec<_> = self.0.iter().filter(|d| d.is_error()).collect();
        write!(f, "build failed with {} error(s)", errors.len())?;
        for diagnostic in errors {
            write!(f, "\n{diagnostic}")?;
        }
        Ok(())
    }
}

/// Top-level error for the crate's entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
