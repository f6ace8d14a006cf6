//! Error types for path parsing and traversal.

use thiserror::Error;

/// Errors produced by parsing or constructing paths and values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The raw path string violates the path grammar.
    #[error("malformed path ({reason}): {path}")]
    Malformed { path: String, reason: &'static str },

    /// The root element does not map to any known data type.
    #[error("unknown data type for root element: {0}")]
    UnknownDataType(String),

    /// A value-attribute value contains the quote delimiter.
    #[error("unsupported '\"' in attribute value: {0}")]
    InvalidAttributeValue(String),
}

impl PathError {
    pub(crate) fn malformed(path: &str, reason: &'static str) -> Self {
        PathError::Malformed {
            path: path.to_string(),
            reason,
        }
    }
}

/// Errors surfaced by [`DataSource`](crate::DataSource) operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A raw path handed out by the store failed to parse.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A visitor aborted the traversal; the failure propagates unchanged.
    #[error("visitor failed: {0}")]
    Visitor(#[source] anyhow::Error),
}
