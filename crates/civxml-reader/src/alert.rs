//! Structured, non-fatal load diagnostics.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

/// A diagnostic raised while binding XML to typed fields.
///
/// Alerts never abort loading: the offending field falls back to its
/// default (or `NONE`) and the load continues, so every problem in a pass
/// can be reported at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum XmlAlert {
    /// An enum field is missing and `NONE` is not allowed.
    #[error("{file}: {record}: missing {tag}")]
    MissingEnumType {
        file: String,
        record: String,
        tag: String,
    },

    /// An enum field names something that is not of the expected type.
    #[error("{file}: {record}: {tag}/{element} = '{text}' is not a {expected}")]
    WrongEnumType {
        file: String,
        record: String,
        tag: String,
        element: String,
        text: String,
        expected: String,
    },

    /// An enum field is literally `NONE` where that is not allowed.
    #[error("{file}: {record}: {tag}/{element} may not be NONE")]
    NoneEnumType {
        file: String,
        record: String,
        tag: String,
        element: String,
    },

    /// A text key that is not present in any text table.
    #[error("{file}: {record}: {tag} uses unknown text key {key}")]
    UnknownTextKey {
        file: String,
        record: String,
        tag: String,
        key: String,
    },

    /// A bool or int field whose text does not parse.
    #[error("{file}: {record}: {tag} = '{text}' is not a number")]
    InvalidNumber {
        file: String,
        record: String,
        tag: String,
        text: String,
    },

    /// An optional file is missing from every search root.
    #[error("{file}: file not found")]
    MissingFile { file: String },

    /// A file could not be parsed; its records are skipped.
    #[error("{file}: malformed document: {message}")]
    MalformedDocument { file: String, message: String },

    /// A record contains an element its schema does not declare.
    #[error("{file}: {record}: unknown field {field}")]
    UnknownField {
        file: String,
        record: String,
        field: String,
    },

    /// A record lacks an element its schema requires.
    #[error("{file}: {record}: missing required field {field}")]
    MissingField {
        file: String,
        record: String,
        field: String,
    },
}

/// Shared sink collecting alerts for a whole load pass.
///
/// Cloning is cheap; all clones append to the same list.
#[derive(Debug, Clone, Default)]
pub struct Alerts {
    inner: Arc<Mutex<Vec<XmlAlert>>>,
}

impl Alerts {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an alert.
    pub fn push(&self, alert: XmlAlert) {
        warn!(%alert, "xml alert");
        self.inner.lock().push(alert);
    }

    /// Number of alerts collected so far.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no alerts were raised.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Copy of the collected alerts.
    pub fn snapshot(&self) -> Vec<XmlAlert> {
        self.inner.lock().clone()
    }

    /// Remove and return all collected alerts.
    pub fn take(&self) -> Vec<XmlAlert> {
        std::mem::take(&mut *self.inner.lock())
    }
}
