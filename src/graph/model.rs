//! Lineage graph records
//!
//! `GraphState` is the in-process rendition of the backend's merge
//! semantics: datasets are keyed by name and edges by the ordered
//! `(source, target)` pair, so a duplicate edge cannot be represented.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{GraphError, GraphResult};

/// A dataset node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetNode {
    pub name: String,
    /// First observation.
    pub created_at: DateTime<Utc>,
}

/// Ordered pair identifying a FEEDS edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub source: String,
    pub target: String,
}

impl EdgeKey {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// A `source --FEEDS--> target` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEdge {
    pub source: String,
    pub target: String,
    /// Set once, on first observation of the pair.
    pub created_at: DateTime<Utc>,
    /// Set on every later observation; `None` until the pair is seen twice.
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl LineageEdge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source.clone(), self.target.clone())
    }
}

/// Outcome of an edge upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeUpsert {
    /// Pair observed for the first time; `createdAt` set.
    Created,
    /// Pair already present; `lastSeenAt` advanced.
    Refreshed,
}

impl EdgeUpsert {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeUpsert::Created => "created",
            EdgeUpsert::Refreshed => "refreshed",
        }
    }
}

/// Serialized form of a `GraphState`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub datasets: Vec<DatasetNode>,
    pub edges: Vec<LineageEdge>,
}

/// Whole-graph contents, ordered for deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphState {
    datasets: BTreeMap<String, DatasetNode>,
    edges: BTreeMap<EdgeKey, LineageEdge>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a dataset node. Returns true if it was created.
    pub fn merge_dataset(&mut self, name: &str, observed_at: DateTime<Utc>) -> bool {
        if self.datasets.contains_key(name) {
            return false;
        }
        self.datasets.insert(
            name.to_string(),
            DatasetNode {
                name: name.to_string(),
                created_at: observed_at,
            },
        );
        true
    }

    /// Merge both endpoints and the FEEDS edge between them.
    pub fn merge_edge(&mut self, source: &str, target: &str, observed_at: DateTime<Utc>) -> EdgeUpsert {
        self.merge_dataset(source, observed_at);
        self.merge_dataset(target, observed_at);

        let key = EdgeKey::new(source, target);
        match self.edges.get_mut(&key) {
            Some(edge) => {
                edge.last_seen_at = Some(observed_at);
                EdgeUpsert::Refreshed
            }
            None => {
                self.edges.insert(
                    key,
                    LineageEdge {
                        source: source.to_string(),
                        target: target.to_string(),
                        created_at: observed_at,
                        last_seen_at: None,
                    },
                );
                EdgeUpsert::Created
            }
        }
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetNode> {
        self.datasets.get(name)
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&LineageEdge> {
        self.edges.get(&EdgeKey::new(source, target))
    }

    pub fn datasets(&self) -> impl Iterator<Item = &DatasetNode> {
        self.datasets.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &LineageEdge> {
        self.edges.values()
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            datasets: self.datasets.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Rebuilds state from a snapshot, rejecting duplicate keys and dangling edges.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> GraphResult<Self> {
        let mut state = GraphState::new();
        for node in snapshot.datasets {
            if state.datasets.contains_key(&node.name) {
                return Err(GraphError::Corrupt(format!("dataset '{}' appears twice", node.name)));
            }
            state.datasets.insert(node.name.clone(), node);
        }
        for edge in snapshot.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !state.datasets.contains_key(endpoint.as_str()) {
                    return Err(GraphError::Corrupt(format!(
                        "edge {} references unknown dataset '{}'",
                        edge.key(),
                        endpoint
                    )));
                }
            }
            let key = edge.key();
            if state.edges.contains_key(&key) {
                return Err(GraphError::DuplicateEdge {
                    upstream: key.source,
                    downstream: key.target,
                });
            }
            state.edges.insert(key, edge);
        }
        Ok(state)
    }

    /// Dataset names and edge keys, ignoring timestamps.
    pub fn shape(&self) -> (Vec<String>, Vec<EdgeKey>) {
        (
            self.datasets.keys().cloned().collect(),
            self.edges.keys().cloned().collect(),
        )
    }
}
