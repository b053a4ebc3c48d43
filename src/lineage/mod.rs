//! # Lineage Recorder
//!
//! Turns a job run (namespace, name, input datasets, output datasets) into
//! graph facts: one `Dataset` node per name and one `FEEDS` edge per
//! `(input, output)` pair.
//!
//! Every input is taken to feed every output. There is no per-column
//! provenance; finer provenance would change this module's contract.
//!
//! Recording the same run twice leaves the same nodes and edges; only
//! `lastSeenAt` moves.

mod errors;
mod recorder;
mod run;

pub use errors::{LineageError, LineageResult};
pub use recorder::{LineageRecorder, LinkedEdge, RecordReport};
pub use run::JobRun;
