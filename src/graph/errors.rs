//! # Graph Store Errors
//!
//! No variant is retried inside the store. Callers decide whether a
//! failed run is worth replaying; upserts are idempotent so a replay
//! converges to the same graph.

use thiserror::Error;

/// Result type for graph store operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Graph store errors
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    /// Connectivity, authentication or timeout failure.
    #[error("graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// Backend answered but rejected the statement; the transaction was rolled back.
    #[error("graph statement failed: {code}: {message}")]
    StatementFailed { code: String, message: String },

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    /// On-disk snapshot could not be trusted.
    #[error("corrupt graph snapshot: {0}")]
    Corrupt(String),

    /// A read observed more than one FEEDS edge for an ordered pair.
    #[error("duplicate FEEDS edges between {upstream} and {downstream}")]
    DuplicateEdge { upstream: String, downstream: String },

    /// Backend response did not have the expected shape.
    #[error("unexpected graph store response: {0}")]
    Protocol(String),
}

impl GraphError {
    /// Returns true for connectivity/auth/timeout failures.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, GraphError::StoreUnavailable(_))
    }

    /// Stable code for CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            GraphError::StatementFailed { .. } => "STORE_STATEMENT_FAILED",
            GraphError::InvalidConfig(_) => "STORE_INVALID_CONFIG",
            GraphError::Corrupt(_) => "STORE_CORRUPT",
            GraphError::DuplicateEdge { .. } => "STORE_DUPLICATE_EDGE",
            GraphError::Protocol(_) => "STORE_PROTOCOL",
        }
    }
}
