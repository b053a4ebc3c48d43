//! Observable events
//!
//! Every log line carries an `event` field taken from this enum, so logs
//! can be filtered by event name regardless of message wording.

use std::fmt;

/// Observable events in trustgate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Graph store
    /// Store reachable and ready
    StoreConnected,
    /// Snapshot loaded from disk
    StoreOpened,
    /// Uniqueness constraint could not be ensured
    StoreConstraintMissing,
    /// Store released
    StoreClosed,

    // Lineage
    /// Recording for a run begins
    LineageStart,
    /// Dataset node merged
    DatasetUpserted,
    /// FEEDS edge merged
    EdgeLinked,
    /// All nodes and edges for a run committed
    LineageRecorded,
    /// Recording aborted
    LineageFailed,

    // Run events
    /// Event delivered to the sink
    EventEmitted,
    /// No sink configured
    EventSkipped,
    /// Sink unreachable or rejected the event
    EventFailed,

    // Gate
    /// Evidence index loaded
    EvidenceLoaded,
    /// Rule set loaded
    RulesLoaded,
    /// A rule was violated
    GateViolation,
    /// Evaluation finished
    GateEvaluated,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreConnected => "STORE_CONNECTED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreConstraintMissing => "STORE_CONSTRAINT_MISSING",
            Event::StoreClosed => "STORE_CLOSED",

            Event::LineageStart => "LINEAGE_BEGIN",
            Event::DatasetUpserted => "DATASET_UPSERTED",
            Event::EdgeLinked => "EDGE_LINKED",
            Event::LineageRecorded => "LINEAGE_RECORDED",
            Event::LineageFailed => "LINEAGE_FAILED",

            Event::EventEmitted => "EVENT_EMITTED",
            Event::EventSkipped => "EVENT_SKIPPED",
            Event::EventFailed => "EVENT_FAILED",

            Event::EvidenceLoaded => "EVIDENCE_LOADED",
            Event::RulesLoaded => "RULES_LOADED",
            Event::GateViolation => "GATE_VIOLATION",
            Event::GateEvaluated => "GATE_EVALUATED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
