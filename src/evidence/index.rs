//! Evidence index document
//!
//! A JSON object mapping artifact keys to either a location string
//! (`"drift_report_html": "artifacts/evidence/drift_report.html"`) or a
//! structured value (`"fairness": {"selection_rate_by_group": {...}}`).
//!
//! The gate engine only reads it. Producers may build and write one here.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::errors::{EvidenceError, EvidenceResult};

/// Map from evidence key to location or value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceIndex {
    entries: Map<String, Value>,
    source: Option<PathBuf>,
}

impl EvidenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses an index file.
    pub fn load(path: impl AsRef<Path>) -> EvidenceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|cause| EvidenceError::Io {
            path: path.display().to_string(),
            cause,
        })?;
        let mut index = Self::from_json_str(&content, &path.display().to_string())?;
        index.source = Some(path.to_path_buf());
        Ok(index)
    }

    /// Parses an index from JSON text; `label` names it in errors.
    pub fn from_json_str(content: &str, label: &str) -> EvidenceResult<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| EvidenceError::Parse {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        match value {
            Value::Object(entries) => Ok(Self {
                entries,
                source: None,
            }),
            _ => Err(EvidenceError::NotAnObject(label.to_string())),
        }
    }

    /// File the index was loaded from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn insert_location(&mut self, key: impl Into<String>, location: impl Into<String>) -> &mut Self {
        self.insert(key, Value::String(location.into()))
    }

    /// Looks up `key`.
    ///
    /// A literal top-level key wins. Otherwise `a.b.c` walks nested objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.entries.get(key) {
            return Some(value);
        }
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = self.entries.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the index as pretty JSON.
    ///
    /// The file is replaced via temp file + fsync + rename, so readers see
    /// either the old index or the new one.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> EvidenceResult<()> {
        let path = path.as_ref();
        let io_err = |cause| EvidenceError::Io {
            path: path.display().to_string(),
            cause,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| EvidenceError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = File::create(&tmp_path).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp_path, path).map_err(io_err)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let dir = OpenOptions::new().read(true).open(parent).map_err(io_err)?;
            dir.sync_all().map_err(io_err)?;
        }
        Ok(())
    }
}
