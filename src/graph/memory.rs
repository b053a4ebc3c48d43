//! Process-local graph store (`memory://`)
//!
//! Holds the whole graph behind one mutex, so each upsert is atomic with
//! respect to concurrent callers in the same process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::errors::{GraphError, GraphResult};
use super::model::{DatasetNode, EdgeUpsert, GraphState, LineageEdge};
use super::store::GraphStore;

/// In-memory graph store.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    state: Mutex<GraphState>,
    closed: AtomicBool,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current graph.
    pub fn snapshot(&self) -> GraphState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn ensure_open(&self) -> GraphResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GraphError::StoreUnavailable("memory store is closed".into()));
        }
        Ok(())
    }
}

impl GraphStore for MemoryGraphStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn ping(&self) -> GraphResult<()> {
        self.ensure_open()
    }

    fn upsert_dataset(&self, name: &str, observed_at: DateTime<Utc>) -> GraphResult<bool> {
        self.ensure_open()?;
        Ok(self.lock().merge_dataset(name, observed_at))
    }

    fn upsert_edge(
        &self,
        source: &str,
        target: &str,
        observed_at: DateTime<Utc>,
    ) -> GraphResult<EdgeUpsert> {
        self.ensure_open()?;
        Ok(self.lock().merge_edge(source, target, observed_at))
    }

    fn dataset(&self, name: &str) -> GraphResult<Option<DatasetNode>> {
        self.ensure_open()?;
        Ok(self.lock().dataset(name).cloned())
    }

    fn edge(&self, source: &str, target: &str) -> GraphResult<Option<LineageEdge>> {
        self.ensure_open()?;
        Ok(self.lock().edge(source, target).cloned())
    }

    fn close(&self) -> GraphResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_upserts_collapse() {
        let store = Arc::new(MemoryGraphStore::new());
        let now = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        store.upsert_edge("shared.in", "shared.out", now).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = store.snapshot();
        assert_eq!(state.edge_count(), 1);
        assert_eq!(state.dataset_count(), 2);
    }

    #[test]
    fn test_closed_store_is_unavailable() {
        let store = MemoryGraphStore::new();
        store.close().unwrap();
        let err = store.upsert_dataset("x", Utc::now()).unwrap_err();
        assert!(err.is_unavailable());
        assert!(store.ping().is_err());
    }
}
