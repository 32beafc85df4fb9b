//! Error types for civxml-common.

use std::path::PathBuf;

use thiserror::Error;

/// Common error type for civxml operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No search root contains the requested file.
    #[error("file not found: {name} (tried {})", display_paths(.tried))]
    NotFound { name: String, tried: Vec<PathBuf> },

    /// A file the caller cannot run without is missing from every root.
    #[error("required file missing: {name}")]
    MissingRequiredFile { name: String },

    /// The search path list has no roots at all.
    #[error("no search roots configured")]
    NoRoots,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
