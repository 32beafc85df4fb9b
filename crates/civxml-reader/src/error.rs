//! Error types for the load path.

use thiserror::Error;

use crate::LoadStage;

/// Errors that can occur while loading game data.
///
/// Problems inside a record (bad enum names, unparseable numbers) are never
/// errors; they are reported as [`XmlAlert`](crate::XmlAlert)s and loading
/// continues.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (path resolution).
    #[error("{0}")]
    Common(#[from] civxml_common::Error),

    /// Document parsing or writing error.
    #[error("{0}")]
    Dom(#[from] civxml_dom::Error),

    /// A document handle was used after the cache it came from was cleared.
    #[error("document {name} used after cache clear (loaded in generation {loaded}, cache is at {current})")]
    StaleDocument {
        name: String,
        loaded: u64,
        current: u64,
    },

    /// An operation was attempted outside the load stage that permits it.
    #[error("operation requires load stage {expected:?}, current stage is {actual:?}")]
    WrongStage {
        expected: LoadStage,
        actual: LoadStage,
    },
}

/// Result type for load operations.
pub type Result<T> = std::result::Result<T, Error>;
