//! Lineage recorder
//!
//! Recording one run:
//! 1. take one observation time from the clock
//! 2. upsert every dataset in `inputs ∪ outputs`, so no edge can reference
//!    a node that does not exist yet
//! 3. upsert one FEEDS edge per `(input, output)` pair
//!
//! Any store failure aborts the rest of the run. Work already committed is
//! left in place; replaying the run is safe.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::errors::{LineageError, LineageResult};
use super::run::JobRun;
use crate::clock::{Clock, SystemClock};
use crate::graph::{EdgeKey, EdgeUpsert, GraphStore};
use crate::observability::Event;

/// One edge written by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedEdge {
    pub source: String,
    pub target: String,
    pub outcome: EdgeUpsert,
}

/// What a successful `record` wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub run_id: Uuid,
    pub observed_at: DateTime<Utc>,
    /// Datasets upserted, inputs first.
    pub datasets: Vec<String>,
    /// Datasets that did not exist before this run.
    pub datasets_created: usize,
    pub edges: Vec<LinkedEdge>,
}

impl RecordReport {
    pub fn edges_created(&self) -> usize {
        self.edges
            .iter()
            .filter(|e| e.outcome == EdgeUpsert::Created)
            .count()
    }
}

/// Writes dataset nodes and FEEDS edges for job runs.
pub struct LineageRecorder {
    store: Arc<dyn GraphStore>,
    clock: Arc<dyn Clock>,
}

impl LineageRecorder {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn GraphStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Builds a run from its parts and records it.
    pub fn record_run<I, O>(
        &self,
        namespace: &str,
        job_name: &str,
        inputs: I,
        outputs: O,
    ) -> LineageResult<RecordReport>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let run = JobRun::new(namespace, job_name, inputs, outputs, self.clock.now())?;
        self.record(&run)
    }

    /// Upserts every dataset of `run`, then every edge of its cross product.
    pub fn record(&self, run: &JobRun) -> LineageResult<RecordReport> {
        let observed_at = self.clock.now();
        let datasets = run.datasets();
        let plan = run.edge_plan();

        info!(
            event = %Event::LineageStart,
            run_id = %run.run_id(),
            namespace = run.namespace(),
            job = run.job_name(),
            datasets = datasets.len(),
            edges = plan.len(),
            "recording lineage"
        );

        let mut datasets_created = 0;
        for name in &datasets {
            let created = self
                .store
                .upsert_dataset(name, observed_at)
                .map_err(|cause| self.fail(run, LineageError::before_commit(cause)))?;
            if created {
                datasets_created += 1;
            }
            debug!(event = %Event::DatasetUpserted, dataset = %name, created, "dataset upserted");
        }

        let total = plan.len();
        let mut edges: Vec<LinkedEdge> = Vec::with_capacity(total);
        for key in plan {
            match self.store.upsert_edge(&key.source, &key.target, observed_at) {
                Ok(outcome) => {
                    info!(
                        event = %Event::EdgeLinked,
                        source = %key.source,
                        target = %key.target,
                        outcome = outcome.as_str(),
                        "linked {}",
                        key
                    );
                    edges.push(LinkedEdge {
                        source: key.source,
                        target: key.target,
                        outcome,
                    });
                }
                Err(cause) if edges.is_empty() => {
                    return Err(self.fail(run, LineageError::before_commit(cause)));
                }
                Err(cause) => {
                    let committed = edges
                        .into_iter()
                        .map(|e| EdgeKey::new(e.source, e.target))
                        .collect();
                    return Err(self.fail(
                        run,
                        LineageError::PartialLineageWrite {
                            committed,
                            failed: key,
                            total,
                            cause,
                        },
                    ));
                }
            }
        }

        let report = RecordReport {
            run_id: run.run_id(),
            observed_at,
            datasets: datasets.into_iter().map(str::to_string).collect(),
            datasets_created,
            edges,
        };
        info!(
            event = %Event::LineageRecorded,
            run_id = %run.run_id(),
            datasets = report.datasets.len(),
            datasets_created = report.datasets_created,
            edges = report.edges.len(),
            edges_created = report.edges_created(),
            "lineage recorded"
        );
        Ok(report)
    }

    fn fail(&self, run: &JobRun, err: LineageError) -> LineageError {
        error!(
            event = %Event::LineageFailed,
            run_id = %run.run_id(),
            backend = self.store.backend(),
            committed = err.committed().len(),
            error = %err,
            "lineage recording aborted"
        );
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::graph::{DatasetNode, GraphError, GraphResult, LineageEdge, MemoryGraphStore};
    use chrono::{Duration, TimeZone};

    /// Answers every write with a rolled-back statement.
    #[derive(Debug)]
    struct RejectingStore;

    impl GraphStore for RejectingStore {
        fn backend(&self) -> &'static str {
            "rejecting"
        }

        fn ping(&self) -> GraphResult<()> {
            Ok(())
        }

        fn upsert_dataset(&self, _name: &str, _observed_at: DateTime<Utc>) -> GraphResult<bool> {
            Err(GraphError::StatementFailed {
                code: "Neo.ClientError.Schema.ConstraintValidationFailed".into(),
                message: "constraint violated".into(),
            })
        }

        fn upsert_edge(
            &self,
            _source: &str,
            _target: &str,
            _observed_at: DateTime<Utc>,
        ) -> GraphResult<EdgeUpsert> {
            unreachable!("datasets fail first")
        }

        fn dataset(&self, _name: &str) -> GraphResult<Option<DatasetNode>> {
            Ok(None)
        }

        fn edge(&self, _source: &str, _target: &str) -> GraphResult<Option<LineageEdge>> {
            Ok(None)
        }
    }

    fn setup() -> (Arc<MemoryGraphStore>, Arc<ManualClock>, LineageRecorder) {
        let store = Arc::new(MemoryGraphStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap(),
        ));
        let recorder = LineageRecorder::with_clock(store.clone(), clock.clone());
        (store, clock, recorder)
    }

    #[test]
    fn test_record_cross_product() {
        let (store, _, recorder) = setup();
        let report = recorder
            .record_run("ns", "job", ["A", "B"], ["X", "Y"])
            .unwrap();

        assert_eq!(report.edges.len(), 4);
        assert_eq!(report.edges_created(), 4);
        assert_eq!(report.datasets_created, 4);

        let state = store.snapshot();
        for (s, t) in [("A", "X"), ("A", "Y"), ("B", "X"), ("B", "Y")] {
            assert!(state.edge(s, t).is_some(), "missing {} -> {}", s, t);
        }
        assert_eq!(state.edge_count(), 4);
    }

    #[test]
    fn test_second_record_refreshes() {
        let (store, clock, recorder) = setup();
        recorder.record_run("ns", "job", ["A"], ["X"]).unwrap();
        let first = store.snapshot();

        clock.advance(Duration::hours(1));
        let report = recorder.record_run("ns", "job", ["A"], ["X"]).unwrap();
        assert_eq!(report.edges[0].outcome, EdgeUpsert::Refreshed);
        assert_eq!(report.datasets_created, 0);

        let second = store.snapshot();
        assert_eq!(first.shape(), second.shape());
        let edge = second.edge("A", "X").unwrap();
        assert_eq!(edge.created_at, first.edge("A", "X").unwrap().created_at);
        assert_eq!(edge.last_seen_at, Some(clock.now()));
    }

    #[test]
    fn test_empty_inputs_create_outputs_only() {
        let (store, _, recorder) = setup();
        let report = recorder
            .record_run("ns", "job", Vec::<String>::new(), ["Y"])
            .unwrap();
        assert!(report.edges.is_empty());
        let state = store.snapshot();
        assert!(state.dataset("Y").is_some());
        assert_eq!(state.edge_count(), 0);
    }

    #[test]
    fn test_one_timestamp_per_run() {
        let (store, clock, recorder) = setup();
        let report = recorder.record_run("ns", "job", ["A"], ["X", "Y"]).unwrap();
        assert_eq!(report.observed_at, clock.now());
        let state = store.snapshot();
        assert!(state.datasets().all(|d| d.created_at == report.observed_at));
        assert!(state.edges().all(|e| e.created_at == report.observed_at));
    }

    #[test]
    fn test_closed_store_fails_before_edges() {
        let (store, _, recorder) = setup();
        store.close().unwrap();
        let err = recorder.record_run("ns", "job", ["A"], ["X"]).unwrap_err();
        assert!(matches!(err, LineageError::StoreUnavailable { .. }));
    }

    #[test]
    fn test_rejected_write_is_not_unavailable() {
        let recorder = LineageRecorder::new(Arc::new(RejectingStore));
        let err = recorder.record_run("ns", "job", ["A"], ["X"]).unwrap_err();
        match err {
            LineageError::StoreFailed {
                cause: GraphError::StatementFailed { code, .. },
            } => assert_eq!(code, "Neo.ClientError.Schema.ConstraintValidationFailed"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
