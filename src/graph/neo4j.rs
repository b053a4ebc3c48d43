//! Neo4j backend over the transactional HTTP API
//!
//! Each store call is one `POST {base}/db/{database}/tx/commit` carrying a
//! single parameterized `MERGE` statement, so the server commits or rolls
//! back the whole call. Timestamps are epoch milliseconds, taken from the
//! caller rather than the server so one run writes one time.
//!
//! Concurrent `MERGE` on `Dataset.name` is race-free only with a uniqueness
//! constraint; `connect` creates it if missing.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::errors::{GraphError, GraphResult};
use super::model::{DatasetNode, EdgeUpsert, LineageEdge};
use super::store::GraphStore;
use crate::observability::Event;

const MERGE_DATASET: &str = "MERGE (d:Dataset {name: $name}) \
     ON CREATE SET d.createdAt = $observedAt \
     RETURN d.createdAt = $observedAt AS created";

const MERGE_EDGE: &str = "MERGE (s:Dataset {name: $source}) \
       ON CREATE SET s.createdAt = $observedAt \
     MERGE (t:Dataset {name: $target}) \
       ON CREATE SET t.createdAt = $observedAt \
     MERGE (s)-[r:FEEDS]->(t) \
       ON CREATE SET r.createdAt = $observedAt \
       ON MATCH SET r.lastSeenAt = $observedAt \
     RETURN r.lastSeenAt IS NULL AS created";

const MATCH_DATASET: &str = "MATCH (d:Dataset {name: $name}) RETURN d.name, d.createdAt";

const MATCH_EDGE: &str = "MATCH (:Dataset {name: $source})-[r:FEEDS]->(:Dataset {name: $target}) \
     RETURN r.createdAt, r.lastSeenAt";

const DATASET_CONSTRAINT: &str = "CREATE CONSTRAINT dataset_name_unique IF NOT EXISTS \
     FOR (d:Dataset) REQUIRE d.name IS UNIQUE";

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<StatementError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct StatementError {
    code: String,
    message: String,
}

/// Neo4j graph store reached over HTTP.
pub struct Neo4jHttpStore {
    client: Client,
    commit_url: Url,
    user: String,
    password: String,
}

impl fmt::Debug for Neo4jHttpStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jHttpStore")
            .field("commit_url", &self.commit_url.as_str())
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Neo4jHttpStore {
    /// Builds the client, probes the server and ensures the dataset constraint.
    pub fn connect(
        base: Url,
        database: &str,
        user: &str,
        password: &str,
        timeout: Duration,
    ) -> GraphResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| GraphError::StoreUnavailable(format!("cannot build HTTP client: {}", e)))?;

        let commit_url = commit_url(&base, database)?;
        let store = Self {
            client,
            commit_url,
            user: user.to_string(),
            password: password.to_string(),
        };

        store.ping()?;
        if let Err(e) = store.run(DATASET_CONSTRAINT, json!({})) {
            warn!(
                event = %Event::StoreConstraintMissing,
                error = %e,
                "could not ensure Dataset.name uniqueness constraint; concurrent merges may race"
            );
        }
        debug!(event = %Event::StoreConnected, url = %store.commit_url, user = %store.user, "neo4j commit endpoint ready");
        Ok(store)
    }

    /// Runs one statement in its own transaction and returns its rows.
    fn run(&self, statement: &str, parameters: Value) -> GraphResult<Vec<Vec<Value>>> {
        let body = json!({
            "statements": [{ "statement": statement, "parameters": parameters }]
        });

        let response = self
            .client
            .post(self.commit_url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json;charset=UTF-8")
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GraphError::StoreUnavailable(format!("request to {} timed out", self.commit_url))
                } else {
                    GraphError::StoreUnavailable(format!("request to {} failed: {}", self.commit_url, e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GraphError::StoreUnavailable(format!(
                "authentication rejected for user '{}' ({})",
                self.user, status
            )));
        }
        if !status.is_success() {
            return Err(GraphError::StoreUnavailable(format!(
                "{} answered {}",
                self.commit_url, status
            )));
        }

        let parsed: CommitResponse = response
            .json()
            .map_err(|e| GraphError::Protocol(format!("invalid commit response: {}", e)))?;
        if let Some(err) = parsed.errors.into_iter().next() {
            if err.code.starts_with("Neo.ClientError.Security") {
                return Err(GraphError::StoreUnavailable(format!("{}: {}", err.code, err.message)));
            }
            return Err(GraphError::StatementFailed {
                code: err.code,
                message: err.message,
            });
        }

        Ok(parsed
            .results
            .into_iter()
            .next()
            .map(|result| result.data.into_iter().map(|r| r.row).collect())
            .unwrap_or_default())
    }
}

impl GraphStore for Neo4jHttpStore {
    fn backend(&self) -> &'static str {
        "neo4j-http"
    }

    fn ping(&self) -> GraphResult<()> {
        self.run("RETURN 1", json!({})).map(|_| ())
    }

    fn upsert_dataset(&self, name: &str, observed_at: DateTime<Utc>) -> GraphResult<bool> {
        let rows = self.run(
            MERGE_DATASET,
            json!({ "name": name, "observedAt": observed_at.timestamp_millis() }),
        )?;
        single_bool(&rows)
    }

    fn upsert_edge(
        &self,
        source: &str,
        target: &str,
        observed_at: DateTime<Utc>,
    ) -> GraphResult<EdgeUpsert> {
        let rows = self.run(
            MERGE_EDGE,
            json!({
                "source": source,
                "target": target,
                "observedAt": observed_at.timestamp_millis(),
            }),
        )?;
        Ok(if single_bool(&rows)? {
            EdgeUpsert::Created
        } else {
            EdgeUpsert::Refreshed
        })
    }

    fn dataset(&self, name: &str) -> GraphResult<Option<DatasetNode>> {
        let rows = self.run(MATCH_DATASET, json!({ "name": name }))?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        Ok(Some(DatasetNode {
            name: name.to_string(),
            created_at: millis_at(row, 1)?.ok_or_else(|| {
                GraphError::Protocol(format!("dataset '{}' has no createdAt", name))
            })?,
        }))
    }

    fn edge(&self, source: &str, target: &str) -> GraphResult<Option<LineageEdge>> {
        let rows = self.run(MATCH_EDGE, json!({ "source": source, "target": target }))?;
        match rows.as_slice() {
            [] => Ok(None),
            [row] => Ok(Some(LineageEdge {
                source: source.to_string(),
                target: target.to_string(),
                created_at: millis_at(row, 0)?.ok_or_else(|| {
                    GraphError::Protocol(format!("edge {} -> {} has no createdAt", source, target))
                })?,
                last_seen_at: millis_at(row, 1)?,
            })),
            _ => Err(GraphError::DuplicateEdge {
                upstream: source.to_string(),
                downstream: target.to_string(),
            }),
        }
    }
}

fn commit_url(base: &Url, database: &str) -> GraphResult<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| GraphError::InvalidConfig(format!("'{}' cannot be a base URL", base)))?;
        segments.pop_if_empty();
        segments.extend(["db", database, "tx", "commit"]);
    }
    Ok(url)
}

fn single_bool(rows: &[Vec<Value>]) -> GraphResult<bool> {
    rows.first()
        .and_then(|row| row.first())
        .and_then(Value::as_bool)
        .ok_or_else(|| GraphError::Protocol("merge statement returned no row".into()))
}

fn millis_at(row: &[Value], column: usize) -> GraphResult<Option<DateTime<Utc>>> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let millis = value
                .as_i64()
                .ok_or_else(|| GraphError::Protocol(format!("expected epoch millis, got {}", value)))?;
            DateTime::<Utc>::from_timestamp_millis(millis)
                .map(Some)
                .ok_or_else(|| GraphError::Protocol(format!("timestamp {} out of range", millis)))
        }
    }
}
