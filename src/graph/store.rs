//! # Graph Store Trait
//!
//! Every backend must give merge-on-unique-key semantics:
//! - `upsert_dataset` never creates a second node with the same name
//! - `upsert_edge` never creates a second FEEDS edge for an ordered pair
//! - each call is one transaction; an edge upsert also merges both endpoints
//!
//! Stores do not retry. A failed call surfaces immediately.

use std::fmt::Debug;

use chrono::{DateTime, Utc};

use super::errors::GraphResult;
use super::model::{DatasetNode, EdgeUpsert, LineageEdge};

/// Backend adapter for the lineage graph.
///
/// Implementations must be safe to call concurrently from independent job
/// runs that reference overlapping dataset names.
pub trait GraphStore: Send + Sync + Debug {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Confirms the store is reachable with the configured credentials.
    fn ping(&self) -> GraphResult<()>;

    /// Creates the dataset node if absent. Returns true if it was created.
    fn upsert_dataset(&self, name: &str, observed_at: DateTime<Utc>) -> GraphResult<bool>;

    /// Creates the FEEDS edge (setting `createdAt`) or advances `lastSeenAt`.
    fn upsert_edge(
        &self,
        source: &str,
        target: &str,
        observed_at: DateTime<Utc>,
    ) -> GraphResult<EdgeUpsert>;

    /// Reads a dataset node.
    fn dataset(&self, name: &str) -> GraphResult<Option<DatasetNode>>;

    /// Reads the FEEDS edge for an ordered pair.
    fn edge(&self, source: &str, target: &str) -> GraphResult<Option<LineageEdge>>;

    /// Releases the store. Further calls may fail.
    fn close(&self) -> GraphResult<()> {
        Ok(())
    }
}
