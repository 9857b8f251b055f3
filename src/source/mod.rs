//! Source identity and dependency resolution.
//!
//! - [`SourceIdentifier`], [`SourceDependency`] - what a source is and what it needs
//! - [`SourceDescriptor`] - a parsed source with its discovered dependencies
//! - [`SourceRegistry`] - shared refcounted registration with cached snapshots
//! - [`linkage`] - dependency satisfaction and ordering

mod descriptor;
mod identifier;
pub mod linkage;
mod registry;

pub use descriptor::{SourceDescriptor, SourceKind};
pub use identifier::{SourceDependency, SourceIdentifier};
pub use registry::{RegistryError, RegistryEvent, SourceRegistry, SourceSnapshot};
