//! # Gate Errors
//!
//! All of these are raised while loading rules, before any evidence is
//! looked at. A rule set that cannot be loaded cannot produce a verdict.
//! Missing evidence is not an error; it is a violation.

use thiserror::Error;

/// Result type for gate operations
pub type GateResult<T> = Result<T, GateError>;

/// Gate rule loading errors
#[derive(Debug, Error)]
pub enum GateError {
    #[error("cannot read rule file {path}: {cause}")]
    Io {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("invalid rule file {path}: {message}")]
    Parse { path: String, message: String },

    /// Unknown check kind, missing comparator or threshold, and the like.
    #[error("invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },
}

impl GateError {
    pub fn invalid_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        GateError::InvalidRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}
