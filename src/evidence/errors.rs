//! # Evidence Index Errors
//!
//! These cover an index that cannot be read at all. A key missing from a
//! readable index is not an error here; the gate engine reports it as a
//! violation.

use thiserror::Error;

/// Result type for evidence index operations
pub type EvidenceResult<T> = Result<T, EvidenceError>;

/// Evidence index errors
#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("cannot read evidence index {path}: {cause}")]
    Io {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("invalid evidence index {path}: {message}")]
    Parse { path: String, message: String },

    /// Top level of the document is not a key/value mapping.
    #[error("evidence index {0} must be a JSON object")]
    NotAnObject(String),
}
