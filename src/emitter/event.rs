//! Run event payload
//!
//! Wire shape (OpenLineage run event):
//! `{eventType, eventTime, run:{runId}, job:{namespace,name},
//!   inputs:[{namespace,name}], outputs:[{namespace,name}], producer, schemaURL}`

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::lineage::JobRun;

/// OpenLineage schema the payload conforms to.
pub const RUN_EVENT_SCHEMA_URL: &str =
    "https://openlineage.io/spec/2-0-2/OpenLineage.json#/definitions/RunEvent";

/// Run lifecycle state carried as `eventType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunState {
    Start,
    Running,
    Complete,
    Fail,
    Abort,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Start => "START",
            RunState::Running => "RUNNING",
            RunState::Complete => "COMPLETE",
            RunState::Fail => "FAIL",
            RunState::Abort => "ABORT",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRef {
    pub run_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRef {
    pub namespace: String,
    pub name: String,
}

/// Immutable event describing one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    pub event_type: RunState,
    #[serde(serialize_with = "iso_utc")]
    pub event_time: DateTime<Utc>,
    pub run: RunRef,
    pub job: JobRef,
    pub inputs: Vec<DatasetRef>,
    pub outputs: Vec<DatasetRef>,
    pub producer: String,
    #[serde(rename = "schemaURL")]
    pub schema_url: String,
}

impl RunEvent {
    /// Consumes `run`; a run yields at most one event.
    ///
    /// Datasets take `dataset_namespace` when given, the job namespace otherwise.
    pub fn from_run(
        run: JobRun,
        state: RunState,
        event_time: DateTime<Utc>,
        producer: &str,
        dataset_namespace: Option<&str>,
    ) -> Self {
        let ds_namespace = dataset_namespace.unwrap_or(run.namespace()).to_string();
        let refs = |names: &[String]| -> Vec<DatasetRef> {
            names
                .iter()
                .map(|name| DatasetRef {
                    namespace: ds_namespace.clone(),
                    name: name.clone(),
                })
                .collect()
        };

        Self {
            event_type: state,
            event_time,
            run: RunRef {
                run_id: run.run_id(),
            },
            job: JobRef {
                namespace: run.namespace().to_string(),
                name: run.job_name().to_string(),
            },
            inputs: refs(run.inputs()),
            outputs: refs(run.outputs()),
            producer: producer.to_string(),
            schema_url: RUN_EVENT_SCHEMA_URL.to_string(),
        }
    }
}

fn iso_utc<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Micros, true))
}
