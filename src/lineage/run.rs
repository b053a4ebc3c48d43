//! Job run identity
//!
//! A `JobRun` lives for one ingestion call: built at the start, read by the
//! recorder, then handed by value to the event emitter. It is never stored.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::{LineageError, LineageResult};
use crate::graph::EdgeKey;

/// One invocation of a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRun {
    run_id: Uuid,
    namespace: String,
    job_name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    started_at: DateTime<Utc>,
}

impl JobRun {
    /// Builds a run with a fresh id.
    ///
    /// Duplicate dataset names are dropped, keeping first-seen order.
    /// Empty input or output sets are legal.
    pub fn new<I, O>(
        namespace: impl Into<String>,
        job_name: impl Into<String>,
        inputs: I,
        outputs: O,
        started_at: DateTime<Utc>,
    ) -> LineageResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let namespace = namespace.into();
        let job_name = job_name.into();
        if namespace.trim().is_empty() {
            return Err(LineageError::InvalidRun("job namespace is empty".into()));
        }
        if job_name.trim().is_empty() {
            return Err(LineageError::InvalidRun("job name is empty".into()));
        }

        Ok(Self {
            run_id: Uuid::new_v4(),
            namespace,
            job_name,
            inputs: dedup_names("input", inputs)?,
            outputs: dedup_names("output", outputs)?,
            started_at,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Union of inputs and outputs, inputs first.
    pub fn datasets(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Every `(input, output)` pair, input-major.
    ///
    /// A dataset listed as both input and output yields a self edge; the
    /// run really did read and write it.
    pub fn edge_plan(&self) -> Vec<EdgeKey> {
        self.inputs
            .iter()
            .flat_map(|src| self.outputs.iter().map(move |dst| EdgeKey::new(src.as_str(), dst.as_str())))
            .collect()
    }
}

fn dedup_names<I>(role: &str, names: I) -> LineageResult<Vec<String>>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let name: String = name.into();
        if name.trim().is_empty() {
            return Err(LineageError::InvalidRun(format!("{} dataset name is empty", role)));
        }
        if seen.insert(name.clone()) {
            out.push(name);
        }
    }
    Ok(out)
}
