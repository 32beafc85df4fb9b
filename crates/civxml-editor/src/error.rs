//! Error types for the editor path.

use thiserror::Error;

/// Errors that can occur while editing data files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path resolution error.
    #[error("{0}")]
    Common(#[from] civxml_common::Error),

    /// Document parsing or writing error.
    #[error("{0}")]
    Dom(#[from] civxml_dom::Error),

    /// Load path error.
    #[error("{0}")]
    Reader(#[from] civxml_reader::Error),

    /// A file description lacks a required child element.
    #[error("file description {tag:?} has no {field}")]
    IncompleteDescription { tag: Option<String>, field: &'static str },

    /// The data file does not reference a schema.
    #[error("{file}: no x-schema reference on the root element")]
    MissingSchema { file: String },

    /// The data file has no record list below its root.
    #[error("{file}: no {record} list found")]
    MissingList { file: String, record: String },

    /// An edit would modify a file that does not belong to the mod.
    #[error("{path} is not part of the mod and cannot be modified")]
    ReadOnlyFile { path: String },

    /// An object id from before the active file changed.
    #[error("object handle is stale (the active file changed)")]
    StaleObject,

    /// Allocating an object that already has an element.
    #[error("{name} is already allocated")]
    AlreadyAllocated { name: String },

    /// An operation that needs an element on an unallocated object.
    #[error("{name} is not allocated")]
    NotAllocated { name: String },

    /// A text key operation on a field that does not hold a text key.
    #[error("{name} is not a text field")]
    NotText { name: String },

    /// No file has been made active yet.
    #[error("no active file")]
    NoActiveFile,

    /// A file index or tag that does not name a loaded container.
    #[error("unknown file {0}")]
    UnknownFile(String),

    /// A backing document index out of range.
    #[error("{file}: no backing document {index}")]
    UnknownDocument { file: String, index: usize },

    /// A text file without a `Civ4GameText` root.
    #[error("{path}: not a text file (missing Civ4GameText root)")]
    MalformedTextFile { path: String },
}

/// Result type for editor operations.
pub type Result<T> = std::result::Result<T, Error>;
