//! # yang-reactor
//!
//! Compiles a closed set of YANG modules and submodules into one
//! effective schema model.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! effective → immutable effective model, final checks
//!   ↓
//! reactor   → statement contexts, namespaces, phases, inference actions,
//!             uses / augment / deviation rewrites
//!   ↓
//! source    → source identity, registry, dependency ordering
//!   ↓
//! model     → statement kinds, parsed arguments, qualified names
//!   ↓
//! parser    → logos lexer + statement parser
//!   ↓
//! base      → LineCol, LineIndex, TextRange, StatementRef
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use yang_reactor::{SourceDescriptor, build};
//!
//! let foo = SourceDescriptor::parse(
//!     "foo.yang",
//!     "module foo { namespace urn:foo; prefix foo;
//!        container top { leaf x { type string; } } }",
//! )
//! .unwrap();
//! let model = build(&[Arc::new(foo)]).unwrap();
//! assert!(model.find_schema_path("/foo:top/foo:x").is_some());
//! ```

// ============================================================================
// FOUNDATION
// ============================================================================

/// Text positions and statement references
pub mod base;

/// Statement-level parser
pub mod parser;

/// Statement kinds, arguments and qualified names
pub mod model;

// ============================================================================
// BUILD
// ============================================================================

/// Source identity, registry and dependency ordering
pub mod source;

/// The multi-phase statement reactor
pub mod reactor;

/// The immutable effective model
pub mod effective;

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod project;

pub(crate) mod graph;

pub use base::{LineCol, LineIndex, StatementRef, TextRange, TextSize};
pub use config::{BuildOptions, FeatureSet};
pub use diagnostics::{Diagnostic, ErrorKind, Severity};
pub use effective::{EffectiveModel, EffectiveModule, EffectiveStatement, Resolved};
pub use error::{BuildError, Error, Result};
pub use model::{QName, QNameModule, Revision, StatementKind, YangVersion};
pub use reactor::{CopyHistory, Phase, build, build_with_options};
pub use source::{SourceDependency, SourceDescriptor, SourceIdentifier, SourceRegistry};
