//! Event Emission Tests
//!
//! Emission is at most once per run and never fails the run:
//! 1. A reachable sink receives exactly one well-formed event
//! 2. An unreachable or rejecting sink downgrades to a warning
//! 3. Recording outcome is independent of the sink

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde_json::Value;

use trustgate::emitter::{
    build_sink, EmissionOutcome, EmitterConfig, RunEventEmitter, SinkConfig, SinkError,
    RUN_EVENT_SCHEMA_URL,
};
use trustgate::graph::MemoryGraphStore;
use trustgate::ingest::LineageIngestor;
use trustgate::lineage::LineageRecorder;

/// A captured HTTP request.
struct Captured {
    request_line: String,
    headers: HashMap<String, String>,
    body: Value,
}

/// Serves one request on a loopback port and answers with `status`.
fn one_shot_server(status: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let length: usize = headers
            .get("content-length")
            .map(|v| v.parse().unwrap())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
            status
        )
        .unwrap();
        stream.flush().unwrap();

        Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: serde_json::from_slice(&body).unwrap(),
        }
    });

    (base, handle)
}

fn sink_config(vars: &[(&str, &str)]) -> SinkConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    SinkConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

#[test]
fn test_event_delivered_over_http() {
    let (base, server) = one_shot_server("200 OK");
    let config = sink_config(&[("OPENLINEAGE_URL", base.as_str()), ("OPENLINEAGE_API_KEY", "s3cret")]);
    let sink = Arc::from(build_sink(&config).unwrap());
    let emitter = RunEventEmitter::new(
        sink,
        EmitterConfig {
            dataset_namespace: Some("warehouse".into()),
            ..EmitterConfig::default()
        },
    );

    let outcome = emitter
        .emit_completion("emm", "train", ["raw", "features"], ["model"])
        .unwrap();
    assert!(outcome.is_delivered());

    let captured = server.join().unwrap();
    assert_eq!(captured.request_line, "POST /api/v1/lineage HTTP/1.1");
    assert_eq!(
        captured.headers.get("authorization").map(String::as_str),
        Some("Bearer s3cret")
    );

    let body = captured.body;
    assert_eq!(body["eventType"], "COMPLETE");
    assert_eq!(body["run"]["runId"], outcome.run_id().to_string());
    assert_eq!(body["job"]["namespace"], "emm");
    assert_eq!(body["job"]["name"], "train");
    assert_eq!(body["inputs"][0]["name"], "raw");
    assert_eq!(body["inputs"][0]["namespace"], "warehouse");
    assert_eq!(body["inputs"].as_array().unwrap().len(), 2);
    assert_eq!(body["outputs"][0]["name"], "model");
    assert_eq!(body["schemaURL"], RUN_EVENT_SCHEMA_URL);
    assert!(body["eventTime"].as_str().unwrap().ends_with('Z'));
    assert!(body["producer"].as_str().is_some());
}

#[test]
fn test_rejected_event_is_soft_failure() {
    let (base, server) = one_shot_server("400 Bad Request");
    let config = sink_config(&[("OPENLINEAGE_URL", base.as_str())]);
    let emitter = RunEventEmitter::new(
        Arc::from(build_sink(&config).unwrap()),
        EmitterConfig::default(),
    );

    let outcome = emitter.emit_completion("emm", "train", ["raw"], ["model"]).unwrap();
    server.join().unwrap();
    assert!(matches!(
        outcome,
        EmissionOutcome::Failed {
            error: SinkError::Rejected { status: 400, .. },
            ..
        }
    ));
}

/// Binds and immediately drops a listener so the port refuses connections.
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[test]
fn test_unreachable_sink_does_not_fail_ingest() {
    let config = sink_config(&[("OPENLINEAGE_URL", closed_port_url().as_str()), ("OPENLINEAGE_TIMEOUT", "2")]);
    let store = Arc::new(MemoryGraphStore::new());
    let ingestor = LineageIngestor::new(
        LineageRecorder::new(store.clone()),
        RunEventEmitter::new(Arc::from(build_sink(&config).unwrap()), EmitterConfig::default()),
    );

    let report = ingestor.ingest_job("emm", "train", ["raw"], ["model"]).unwrap();
    assert!(matches!(
        report.emission,
        EmissionOutcome::Failed {
            error: SinkError::Unavailable(_),
            ..
        }
    ));
    assert_eq!(report.record.edges.len(), 1);
    assert!(store.snapshot().edge("raw", "model").is_some());
}

#[test]
fn test_disabled_sink_skips() {
    let config = sink_config(&[("OPENLINEAGE_URL", "http://127.0.0.1:9"), ("OPENLINEAGE_DISABLED", "true")]);
    assert!(!config.is_active());

    let emitter = RunEventEmitter::new(Arc::from(build_sink(&config).unwrap()), EmitterConfig::default());
    let outcome = emitter.emit_completion("emm", "train", ["raw"], ["model"]).unwrap();
    assert!(matches!(outcome, EmissionOutcome::Skipped { .. }));
}

#[test]
fn test_each_run_gets_its_own_id() {
    let config = sink_config(&[]);
    let emitter = RunEventEmitter::new(Arc::from(build_sink(&config).unwrap()), EmitterConfig::default());

    let first = emitter.emit_completion("emm", "train", ["raw"], ["model"]).unwrap();
    let second = emitter.emit_completion("emm", "train", ["raw"], ["model"]).unwrap();
    assert_ne!(first.run_id(), second.run_id());
}
