//! Error types for document parsing, editing and writing.

use std::path::PathBuf;

use thiserror::Error;

use crate::NodeId;

/// Errors that can occur when working with XML documents.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] civxml_common::Error),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The document has no root element.
    #[error("document has no root element")]
    MissingRoot,

    /// A node id that does not refer to a live node.
    #[error("invalid node id: {0:?}")]
    InvalidNode(NodeId),

    /// A move that would make a node its own descendant.
    #[error("cannot move {node:?} under its own descendant {target:?}")]
    InvalidMove { node: NodeId, target: NodeId },

    /// Saving a document failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, Error>;
