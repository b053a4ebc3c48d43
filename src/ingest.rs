//! Record-then-emit pipeline
//!
//! One ingestion call:
//! 1. builds the `JobRun`
//! 2. records its lineage (hard-fail)
//! 3. emits exactly one run event, `COMPLETE` or `FAIL` (soft-fail)
//!
//! The run is moved into the emitter, so it cannot be emitted again.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::emitter::{EmissionOutcome, RunEventEmitter, RunState};
use crate::lineage::{JobRun, LineageRecorder, LineageResult, RecordReport};

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub record: RecordReport,
    pub emission: EmissionOutcome,
}

/// Summary suitable for printing.
#[derive(Debug, Serialize)]
struct IngestSummary<'a> {
    run_id: String,
    datasets: usize,
    datasets_created: usize,
    edges: usize,
    edges_created: usize,
    event: &'a str,
}

impl IngestReport {
    /// One-line JSON summary of the run.
    pub fn summary_json(&self) -> String {
        let summary = IngestSummary {
            run_id: self.record.run_id.to_string(),
            datasets: self.record.datasets.len(),
            datasets_created: self.record.datasets_created,
            edges: self.record.edges.len(),
            edges_created: self.record.edges_created(),
            event: match self.emission {
                EmissionOutcome::Delivered { .. } => "delivered",
                EmissionOutcome::Skipped { .. } => "skipped",
                EmissionOutcome::Failed { .. } => "failed",
            },
        };
        serde_json::to_string(&summary).unwrap_or_default()
    }
}

/// Records a run's lineage and announces it.
pub struct LineageIngestor {
    recorder: LineageRecorder,
    emitter: RunEventEmitter,
    clock: Arc<dyn Clock>,
}

impl LineageIngestor {
    pub fn new(recorder: LineageRecorder, emitter: RunEventEmitter) -> Self {
        Self::with_clock(recorder, emitter, Arc::new(SystemClock))
    }

    pub fn with_clock(recorder: LineageRecorder, emitter: RunEventEmitter, clock: Arc<dyn Clock>) -> Self {
        Self {
            recorder,
            emitter,
            clock,
        }
    }

    /// Validates the parts, then ingests the resulting run.
    pub fn ingest_job<I, O>(
        &self,
        namespace: &str,
        job_name: &str,
        inputs: I,
        outputs: O,
    ) -> LineageResult<IngestReport>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let run = JobRun::new(namespace, job_name, inputs, outputs, self.clock.now())?;
        self.ingest(run)
    }

    /// Records `run`, then emits its single event.
    ///
    /// A recording failure still emits `FAIL` before the error is returned.
    pub fn ingest(&self, run: JobRun) -> LineageResult<IngestReport> {
        match self.recorder.record(&run) {
            Ok(record) => {
                let emission = self.emitter.emit(run, RunState::Complete);
                Ok(IngestReport { record, emission })
            }
            Err(err) => {
                self.emitter.emit(run, RunState::Fail);
                Err(err)
            }
        }
    }
}
