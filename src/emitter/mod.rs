//! # Run Event Emitter
//!
//! Describes a finished job run (identity, input and output datasets) as an
//! OpenLineage run event and hands it to an external sink.
//!
//! Graph writes are hard-fail; event emission is soft-fail. An absent or
//! unreachable sink costs a warning, never the run.

mod config;
mod emitter;
mod errors;
mod event;
mod sink;

pub use config::{EmitterConfig, SinkConfig, DEFAULT_ENDPOINT, DEFAULT_PRODUCER, DEFAULT_SINK_TIMEOUT};
pub use emitter::{EmissionOutcome, RunEventEmitter};
pub use errors::{SinkError, SinkResult};
pub use event::{DatasetRef, JobRef, RunEvent, RunRef, RunState, RUN_EVENT_SCHEMA_URL};
pub use sink::{build_sink, EventSink, HttpEventSink, NullEventSink};
