//! # Event Sink Errors
//!
//! Sink errors stay inside the emitter. They are logged at WARN and turned
//! into an `EmissionOutcome`; they never fail a run.

use thiserror::Error;

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Event sink errors
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("event sink not configured")]
    NotConfigured,

    /// Connection refused, DNS failure, timeout.
    #[error("event sink unavailable: {0}")]
    Unavailable(String),

    /// Sink answered with a non-success status.
    #[error("event sink rejected event with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("cannot encode event: {0}")]
    Encode(String),

    #[error("invalid sink configuration: {0}")]
    InvalidConfig(String),
}
