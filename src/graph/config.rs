//! Graph store connection settings
//!
//! The URI scheme picks the backend:
//! - `http://`, `https://`: Neo4j transactional HTTP endpoint
//! - `file:///path/graph.json`: local snapshot file
//! - `memory://`: process-local store

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::errors::{GraphError, GraphResult};

/// Default request timeout for the graph backend.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default Neo4j database name.
pub const DEFAULT_DATABASE: &str = "neo4j";

/// Backend selected by a store URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// Neo4j HTTP API rooted at this base URL.
    Neo4jHttp(Url),
    /// JSON snapshot file.
    File(PathBuf),
    Memory,
}

/// Connection settings for the graph store.
#[derive(Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(uri: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            database: DEFAULT_DATABASE.to_string(),
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the settings and resolves the backend.
    pub fn target(&self) -> GraphResult<StoreTarget> {
        if self.timeout.is_zero() {
            return Err(GraphError::InvalidConfig("timeout must be > 0".into()));
        }
        let uri = self.uri.trim();
        if uri.is_empty() {
            return Err(GraphError::InvalidConfig("store URI is empty".into()));
        }
        let url = Url::parse(uri)
            .map_err(|e| GraphError::InvalidConfig(format!("invalid store URI '{}': {}", uri, e)))?;

        match url.scheme() {
            "http" | "https" => {
                if self.database.trim().is_empty() {
                    return Err(GraphError::InvalidConfig("database name is empty".into()));
                }
                Ok(StoreTarget::Neo4jHttp(url))
            }
            "file" => url
                .to_file_path()
                .map(StoreTarget::File)
                .map_err(|_| GraphError::InvalidConfig(format!("'{}' is not a usable file path", uri))),
            "memory" => Ok(StoreTarget::Memory),
            "bolt" | "bolt+s" | "bolt+ssc" | "neo4j" | "neo4j+s" | "neo4j+ssc" => {
                Err(GraphError::InvalidConfig(format!(
                    "'{}' uses the Bolt protocol, which is not supported; point --store-uri at the \
                     Neo4j HTTP endpoint instead (e.g. http://{}:7474)",
                    uri,
                    url.host_str().unwrap_or("localhost")
                )))
            }
            other => Err(GraphError::InvalidConfig(format!(
                "unsupported store scheme '{}'",
                other
            ))),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(uri: &str) -> StoreConfig {
        StoreConfig::new(uri, "neo4j", "secret")
    }

    #[test]
    fn test_http_target() {
        let target = config("http://localhost:7474").target().unwrap();
        assert!(matches!(target, StoreTarget::Neo4jHttp(url) if url.port() == Some(7474)));
    }

    #[test]
    fn test_memory_target() {
        assert_eq!(config("memory://").target().unwrap(), StoreTarget::Memory);
    }

    #[test]
    fn test_file_target() {
        let target = config("file:///tmp/lineage/graph.json").target().unwrap();
        assert_eq!(target, StoreTarget::File(PathBuf::from("/tmp/lineage/graph.json")));
    }

    #[test]
    fn test_bolt_rejected_with_hint() {
        let err = config("neo4j://db.internal:7687").target().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Bolt"));
        assert!(msg.contains("http://db.internal:7474"));
    }

    #[test]
    fn test_empty_uri_rejected() {
        assert!(matches!(config("  ").target(), Err(GraphError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cfg = config("memory://").with_timeout(Duration::ZERO);
        assert!(cfg.target().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", config("memory://"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
