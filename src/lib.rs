//! trustgate - dataset lineage ingestion and promotion gates
//!
//! - `graph`: idempotent Dataset / FEEDS upserts over a property graph
//! - `lineage`: turns job runs into graph facts
//! - `emitter`: OpenLineage run events, best effort
//! - `ingest`: record-then-emit pipeline
//! - `evidence` and `gate`: fail-closed promotion checks

pub mod cli;
pub mod clock;
pub mod emitter;
pub mod evidence;
pub mod gate;
pub mod graph;
pub mod ingest;
pub mod lineage;
pub mod observability;
