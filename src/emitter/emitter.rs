//! Run event emitter
//!
//! Emission is best effort. The graph is the system of record; the event is
//! a notification that downstream consumers can afford to miss. So:
//! - no sink configured: WARN, `Skipped`
//! - sink unreachable or rejecting: WARN, `Failed`
//! - neither case is an error for the caller

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::config::EmitterConfig;
use super::errors::SinkError;
use super::event::{RunEvent, RunState};
use super::sink::EventSink;
use crate::clock::{Clock, SystemClock};
use crate::lineage::{JobRun, LineageResult};
use crate::observability::Event;

/// What happened to a run's event.
#[derive(Debug, Clone)]
pub enum EmissionOutcome {
    Delivered { run_id: Uuid },
    Skipped { run_id: Uuid },
    Failed { run_id: Uuid, error: SinkError },
}

impl EmissionOutcome {
    pub fn run_id(&self) -> Uuid {
        match self {
            EmissionOutcome::Delivered { run_id }
            | EmissionOutcome::Skipped { run_id }
            | EmissionOutcome::Failed { run_id, .. } => *run_id,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, EmissionOutcome::Delivered { .. })
    }
}

/// Builds run events and hands them to a sink.
pub struct RunEventEmitter {
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    config: EmitterConfig,
}

impl RunEventEmitter {
    pub fn new(sink: Arc<dyn EventSink>, config: EmitterConfig) -> Self {
        Self::with_clock(sink, config, Arc::new(SystemClock))
    }

    pub fn with_clock(sink: Arc<dyn EventSink>, config: EmitterConfig, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock, config }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Emits a `COMPLETE` event for a fresh run built from the given parts.
    ///
    /// Errors only when the parts do not form a valid run; sink trouble is
    /// reported through the outcome.
    pub fn emit_completion<I, O>(
        &self,
        namespace: &str,
        job_name: &str,
        inputs: I,
        outputs: O,
    ) -> LineageResult<EmissionOutcome>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let run = JobRun::new(namespace, job_name, inputs, outputs, self.clock.now())?;
        Ok(self.emit(run, RunState::Complete))
    }

    /// Builds the event for `run` and delivers it once.
    pub fn emit(&self, run: JobRun, state: RunState) -> EmissionOutcome {
        let event = RunEvent::from_run(
            run,
            state,
            self.clock.now(),
            &self.config.producer,
            self.config.dataset_namespace.as_deref(),
        );
        self.deliver(&event)
    }

    fn deliver(&self, event: &RunEvent) -> EmissionOutcome {
        let run_id = event.run.run_id;

        if !self.sink.is_configured() {
            warn!(
                event = %Event::EventSkipped,
                run_id = %run_id,
                event_type = %event.event_type,
                "no lineage event sink configured; skipping event emission"
            );
            return EmissionOutcome::Skipped { run_id };
        }

        match self.sink.send(event) {
            Ok(()) => {
                info!(
                    event = %Event::EventEmitted,
                    run_id = %run_id,
                    event_type = %event.event_type,
                    job = %format!("{}.{}", event.job.namespace, event.job.name),
                    sink = %self.sink.describe(),
                    "emitted lineage event"
                );
                EmissionOutcome::Delivered { run_id }
            }
            Err(error) => {
                warn!(
                    event = %Event::EventFailed,
                    run_id = %run_id,
                    event_type = %event.event_type,
                    sink = %self.sink.describe(),
                    error = %error,
                    "lineage event not delivered; lineage graph is unaffected"
                );
                EmissionOutcome::Failed { run_id, error }
            }
        }
    }
}
