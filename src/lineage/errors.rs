//! # Lineage Recording Errors
//!
//! - `InvalidRun`: rejected before any write
//! - `StoreUnavailable`: the store could not be reached before any edge
//!   was committed
//! - `StoreFailed`: the store answered but rejected a write before any edge
//!   was committed
//! - `PartialLineageWrite`: some edges were committed before the failure
//!
//! A caller may replay the whole run after either store error; upserts are
//! idempotent so the replay converges to the intended graph.

use thiserror::Error;

use crate::graph::{EdgeKey, GraphError};

/// Result type for lineage operations
pub type LineageResult<T> = Result<T, LineageError>;

/// Lineage recording errors
#[derive(Debug, Error)]
pub enum LineageError {
    #[error("invalid run: {0}")]
    InvalidRun(String),

    #[error("graph store unavailable: {cause}")]
    StoreUnavailable {
        #[source]
        cause: GraphError,
    },

    #[error("graph store write failed: {cause}")]
    StoreFailed {
        #[source]
        cause: GraphError,
    },

    #[error(
        "partial lineage write: {} of {total} edges committed before {failed} failed: {cause}",
        .committed.len()
    )]
    PartialLineageWrite {
        /// Edges committed before the failure, in write order.
        committed: Vec<EdgeKey>,
        /// Edge whose upsert failed.
        failed: EdgeKey,
        /// Edges planned for the run.
        total: usize,
        #[source]
        cause: GraphError,
    },
}

impl LineageError {
    /// Error for a store failure that left no edge committed.
    pub fn before_commit(cause: GraphError) -> Self {
        if cause.is_unavailable() {
            LineageError::StoreUnavailable { cause }
        } else {
            LineageError::StoreFailed { cause }
        }
    }

    /// Edges already committed when the error occurred.
    pub fn committed(&self) -> &[EdgeKey] {
        match self {
            LineageError::PartialLineageWrite { committed, .. } => committed,
            _ => &[],
        }
    }

    /// Stable code for CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            LineageError::InvalidRun(_) => "LINEAGE_INVALID_RUN",
            LineageError::StoreUnavailable { .. } => "LINEAGE_STORE_UNAVAILABLE",
            LineageError::StoreFailed { .. } => "LINEAGE_STORE_FAILED",
            LineageError::PartialLineageWrite { .. } => "LINEAGE_PARTIAL_WRITE",
        }
    }
}
