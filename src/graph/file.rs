//! Local JSON snapshot store (`file://`)
//!
//! Layout on disk:
//! - `<path>`: envelope `{format_version, checksum, payload}` where `payload`
//!   is the serialized graph and `checksum` its CRC32
//! - `<path>.lock`: held exclusively while a store is open
//!
//! Every upsert rewrites the snapshot via temp file + fsync + rename, so a
//! crash leaves either the old or the new graph. If persisting fails the
//! in-memory mutation is dropped and the call reports an error.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::errors::{GraphError, GraphResult};
use super::model::{DatasetNode, EdgeUpsert, GraphSnapshot, GraphState, LineageEdge};
use super::store::GraphStore;
use crate::observability::Event;

const FORMAT_VERSION: u8 = 1;

fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    format_version: u8,
    checksum: u32,
    payload: String,
}

#[derive(Debug)]
struct Inner {
    state: GraphState,
    /// Lock file; `None` once closed.
    lock_path: Option<PathBuf>,
}

/// Graph store persisted to a single JSON file.
///
/// One process at a time: a second `open` on the same path fails with
/// `StoreUnavailable` until the first store is closed.
#[derive(Debug)]
pub struct JsonFileGraphStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl JsonFileGraphStore {
    /// Acquires the lock file and loads the existing snapshot, if any.
    pub fn open(path: impl AsRef<Path>) -> GraphResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                GraphError::StoreUnavailable(format!(
                    "cannot create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let lock_path = lock_path_for(&path);
        acquire_lock(&lock_path)?;

        let state = match load_state(&path) {
            Ok(state) => state,
            Err(e) => {
                release_lock(&lock_path);
                return Err(e);
            }
        };
        debug!(
            event = %Event::StoreOpened,
            path = %path.display(),
            datasets = state.dataset_count(),
            edges = state.edge_count(),
            "file store loaded"
        );

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                state,
                lock_path: Some(lock_path),
            }),
        })
    }

    /// Copy of the current graph.
    pub fn snapshot(&self) -> GraphState {
        self.lock().state.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Applies `mutate` to a copy of the graph, persists it, then swaps it in.
    fn transact<T>(&self, mutate: impl FnOnce(&mut GraphState) -> T) -> GraphResult<T> {
        let mut inner = self.lock();
        if inner.lock_path.is_none() {
            return Err(GraphError::StoreUnavailable(format!(
                "file store {} is closed",
                self.path.display()
            )));
        }
        let mut next = inner.state.clone();
        let out = mutate(&mut next);
        if next != inner.state {
            persist(&self.path, &next)?;
            inner.state = next;
        }
        Ok(out)
    }

    fn read<T>(&self, f: impl FnOnce(&GraphState) -> T) -> GraphResult<T> {
        let inner = self.lock();
        if inner.lock_path.is_none() {
            return Err(GraphError::StoreUnavailable(format!(
                "file store {} is closed",
                self.path.display()
            )));
        }
        Ok(f(&inner.state))
    }
}

impl GraphStore for JsonFileGraphStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    fn ping(&self) -> GraphResult<()> {
        self.read(|_| ())
    }

    fn upsert_dataset(&self, name: &str, observed_at: DateTime<Utc>) -> GraphResult<bool> {
        self.transact(|state| state.merge_dataset(name, observed_at))
    }

    fn upsert_edge(
        &self,
        source: &str,
        target: &str,
        observed_at: DateTime<Utc>,
    ) -> GraphResult<EdgeUpsert> {
        self.transact(|state| state.merge_edge(source, target, observed_at))
    }

    fn dataset(&self, name: &str) -> GraphResult<Option<DatasetNode>> {
        self.read(|state| state.dataset(name).cloned())
    }

    fn edge(&self, source: &str, target: &str) -> GraphResult<Option<LineageEdge>> {
        self.read(|state| state.edge(source, target).cloned())
    }

    fn close(&self) -> GraphResult<()> {
        let mut inner = self.lock();
        if let Some(lock_path) = inner.lock_path.take() {
            release_lock(&lock_path);
        }
        Ok(())
    }
}

impl Drop for JsonFileGraphStore {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Some(lock_path) = inner.lock_path.take() {
            release_lock(&lock_path);
        }
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

fn acquire_lock(lock_path: &Path) -> GraphResult<()> {
    match OpenOptions::new().write(true).create_new(true).open(lock_path) {
        Ok(mut file) => {
            let _ = writeln!(file, "{}", std::process::id());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(GraphError::StoreUnavailable(format!(
            "store is locked by another process ({}); remove it if no writer is running",
            lock_path.display()
        ))),
        Err(e) => Err(GraphError::StoreUnavailable(format!(
            "cannot create lock file {}: {}",
            lock_path.display(),
            e
        ))),
    }
}

fn release_lock(lock_path: &Path) {
    if let Err(e) = fs::remove_file(lock_path) {
        warn!(
            event = %Event::StoreClosed,
            path = %lock_path.display(),
            error = %e,
            "failed to remove store lock file"
        );
    }
}

fn load_state(path: &Path) -> GraphResult<GraphState> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(GraphState::new()),
        Err(e) => {
            return Err(GraphError::StoreUnavailable(format!(
                "cannot read {}: {}",
                path.display(),
                e
            )))
        }
    };

    let envelope: Envelope = serde_json::from_str(&content)
        .map_err(|e| GraphError::Corrupt(format!("{}: invalid envelope: {}", path.display(), e)))?;
    if envelope.format_version != FORMAT_VERSION {
        return Err(GraphError::Corrupt(format!(
            "{}: unsupported format version {}",
            path.display(),
            envelope.format_version
        )));
    }
    if compute_checksum(envelope.payload.as_bytes()) != envelope.checksum {
        return Err(GraphError::Corrupt(format!(
            "{}: checksum mismatch",
            path.display()
        )));
    }

    let snapshot: GraphSnapshot = serde_json::from_str(&envelope.payload)
        .map_err(|e| GraphError::Corrupt(format!("{}: invalid payload: {}", path.display(), e)))?;
    GraphState::from_snapshot(snapshot)
}

fn persist(path: &Path, state: &GraphState) -> GraphResult<()> {
    let io_err = |what: &str, e: std::io::Error| {
        GraphError::StoreUnavailable(format!("{} {}: {}", what, path.display(), e))
    };

    let payload = serde_json::to_string(&state.to_snapshot())
        .map_err(|e| GraphError::Protocol(format!("cannot serialize graph: {}", e)))?;
    let envelope = Envelope {
        format_version: FORMAT_VERSION,
        checksum: compute_checksum(payload.as_bytes()),
        payload,
    };
    let bytes = serde_json::to_vec_pretty(&envelope)
        .map_err(|e| GraphError::Protocol(format!("cannot serialize envelope: {}", e)))?;

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = File::create(&tmp_path).map_err(|e| io_err("cannot create temp file for", e))?;
    file.write_all(&bytes)
        .map_err(|e| io_err("cannot write temp file for", e))?;
    file.sync_all()
        .map_err(|e| io_err("cannot fsync temp file for", e))?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| io_err("cannot replace", e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let dir = OpenOptions::new()
            .read(true)
            .open(parent)
            .map_err(|e| io_err("cannot open directory of", e))?;
        dir.sync_all()
            .map_err(|e| io_err("cannot fsync directory of", e))?;
    }
    Ok(())
}
