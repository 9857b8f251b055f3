use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::parser::SyntaxError;
use crate::source::SourceDescriptor;

/// Why one file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("directory not found: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to load {} file(s):\n  {}", .0.len(), render(.0))]
    Files(Vec<LoadFailure>),
}

fn render(failures: &[LoadFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  ")
}

/// Loads every `*.yang` file below `root`, parsing them in parallel.
///
/// Sources come back sorted by path. Any file that cannot be read or
/// parsed fails the whole load; the error lists all of them.
pub fn load_directory(root: impl AsRef<Path>) -> Result<Vec<Arc<SourceDescriptor>>, LoadError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(LoadError::NotADirectory(root.to_path_buf()));
    }

    let mut failures = Vec::new();
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "yang") => {
                paths.push(entry.into_path());
            }
            Ok(_) => {}
            Err(error) => failures.push(LoadFailure::Walk(error)),
        }
    }

    let results: Vec<_> = paths
        .par_iter()
        .map(|path| {
            let name = path.strip_prefix(root).unwrap_or(path);
            load_file_as(path, &name.display().to_string())
        })
        .collect();

    let mut sources = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(source) => sources.push(Arc::new(source)),
            Err(failure) => failures.push(failure),
        }
    }
    debug!(root = %root.display(), loaded = sources.len(), failed = failures.len(), "directory loaded");

    if failures.is_empty() {
        Ok(sources)
    } else {
        Err(LoadError::Files(failures))
    }
}

/// Loads one source file, named after its path.
pub fn load_file(path: impl AsRef<Path>) -> Result<SourceDescriptor, LoadFailure> {
    let path = path.as_ref();
    load_file_as(path, &path.display().to_string())
}

fn load_file_as(path: &Path, name: &str) -> Result<SourceDescriptor, LoadFailure> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadFailure::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SourceDescriptor::parse(name, text)?)
}
