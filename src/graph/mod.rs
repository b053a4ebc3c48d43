//! # Graph Store Client
//!
//! Idempotent upsert primitives over a property-graph backend:
//! - `Dataset` nodes keyed by name
//! - `FEEDS` edges keyed by the ordered `(source, target)` pair
//!
//! The store handle is acquired once at startup with [`connect`] and
//! released with [`GraphStore::close`] at shutdown; it is never
//! re-established per call.

mod config;
mod errors;
mod file;
mod memory;
mod model;
mod neo4j;
mod store;

pub use config::{StoreConfig, StoreTarget, DEFAULT_DATABASE, DEFAULT_STORE_TIMEOUT};
pub use errors::{GraphError, GraphResult};
pub use file::JsonFileGraphStore;
pub use memory::MemoryGraphStore;
pub use model::{DatasetNode, EdgeKey, EdgeUpsert, GraphSnapshot, GraphState, LineageEdge};
pub use neo4j::Neo4jHttpStore;
pub use store::GraphStore;

use tracing::info;

use crate::observability::Event;

/// Opens the backend named by `config.uri`.
///
/// Each backend verifies itself while opening. Fails with
/// `StoreUnavailable` if the backend cannot be reached, and with
/// `InvalidConfig` if the URI is unusable.
pub fn connect(config: &StoreConfig) -> GraphResult<Box<dyn GraphStore>> {
    let store: Box<dyn GraphStore> = match config.target()? {
        StoreTarget::Neo4jHttp(base) => Box::new(Neo4jHttpStore::connect(
            base,
            &config.database,
            &config.user,
            &config.password,
            config.timeout,
        )?),
        StoreTarget::File(path) => Box::new(JsonFileGraphStore::open(path)?),
        StoreTarget::Memory => Box::new(MemoryGraphStore::new()),
    };
    info!(event = %Event::StoreConnected, backend = store.backend(), "graph store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_connect_memory() {
        let store = connect(&StoreConfig::new("memory://", "", "")).unwrap();
        assert_eq!(store.backend(), "memory");
        assert!(store.upsert_dataset("a", Utc::now()).unwrap());
    }

    #[test]
    fn test_connect_file() {
        let dir = TempDir::new().unwrap();
        let uri = url::Url::from_file_path(dir.path().join("graph.json")).unwrap();
        let store = connect(&StoreConfig::new(uri.as_str(), "", "")).unwrap();
        assert_eq!(store.backend(), "file");
        store.close().unwrap();
    }

    #[test]
    fn test_connect_rejects_bolt() {
        let err = connect(&StoreConfig::new("bolt://localhost:7687", "u", "p")).unwrap_err();
        assert!(matches!(err, GraphError::InvalidConfig(_)));
    }
}
