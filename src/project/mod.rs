//! Loading sources from disk.
//!
//! The reactor itself does no I/O; this module turns a directory of
//! `*.yang` files into descriptors ready for a build or a registry.

mod loader;

pub use loader::{LoadError, LoadFailure, load_directory, load_file};
