//! CLI command implementations
//!
//! Exit status contract:
//! - 0: command succeeded / all gates passed
//! - 2: at least one gate violated
//! - 1: any error (usage, config, store, lineage, unreadable inputs)
//!
//! clap's own usage errors exit 2 by default, which would read as a gate
//! failure, so parsing is done here and remapped to 1.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::error::ErrorKind;
use tracing::{info, warn};

use crate::emitter::{build_sink, EmitterConfig, EventSink, NullEventSink, RunEventEmitter, SinkConfig};
use crate::evidence::{EvidenceIndex, FileSystemLocator};
use crate::gate::{GateEngine, GateVerdict, RuleSet};
use crate::graph::{self, GraphStore, StoreConfig};
use crate::ingest::LineageIngestor;
use crate::lineage::LineageRecorder;
use crate::observability::{self, Event, LogFormat};

use super::args::{Cli, Command, OutputFormat};
use super::errors::{CliError, CliResult, EXIT_ERROR};

/// How a command that did not error finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    GatesFailed,
}

impl CommandStatus {
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandStatus::Success => crate::gate::EXIT_PASSED,
            CommandStatus::GatesFailed => crate::gate::EXIT_VIOLATED,
        }
    }
}

impl From<&GateVerdict> for CommandStatus {
    fn from(verdict: &GateVerdict) -> Self {
        if verdict.passed() {
            CommandStatus::Success
        } else {
            CommandStatus::GatesFailed
        }
    }
}

/// Main CLI entry point
///
/// Parses process arguments, installs logging and dispatches. Returns the
/// process exit status. This is the only function that main.rs should call.
pub fn run() -> u8 {
    run_from(std::env::args_os())
}

/// Same as [`run`] for an explicit argument list.
pub fn run_from<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_args(args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return parse_failure_exit_code(e.kind());
        }
    };

    observability::init(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run_command(cli.command, &mut out) {
        Ok(status) => status.exit_code(),
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

fn parse_failure_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => EXIT_ERROR,
    }
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command, out: &mut impl Write) -> CliResult<CommandStatus> {
    match cmd {
        Command::Ingest {
            store_uri,
            store_user,
            store_pass,
            store_database,
            store_timeout_secs,
            job_namespace,
            job_name,
            inputs,
            outputs,
            dataset_namespace,
            producer,
        } => {
            if store_timeout_secs == 0 {
                return Err(CliError::usage("--store-timeout-secs must be > 0"));
            }
            let store = StoreConfig::new(store_uri, store_user, store_pass)
                .with_database(store_database)
                .with_timeout(Duration::from_secs(store_timeout_secs));
            let mut emitter = EmitterConfig::default();
            if let Some(producer) = producer {
                emitter.producer = producer;
            }
            emitter.dataset_namespace = dataset_namespace;

            ingest(
                &store,
                sink_from_env(),
                emitter,
                &job_namespace,
                &job_name,
                inputs,
                outputs,
                out,
            )
        }
        Command::CheckGates {
            index,
            rules,
            evidence_root,
            format,
        } => check_gates(&index, &rules, evidence_root, format, out),
    }
}

/// Builds the event sink from `OPENLINEAGE_*` settings.
///
/// Emission is soft-fail, so unusable settings fall back to no sink.
fn sink_from_env() -> Arc<dyn EventSink> {
    match SinkConfig::from_env().and_then(|config| build_sink(&config)) {
        Ok(sink) => Arc::from(sink),
        Err(e) => {
            warn!(event = %Event::EventSkipped, error = %e, "lineage event sink disabled");
            Arc::new(NullEventSink)
        }
    }
}

/// Record one job run and emit its event.
///
/// The store is opened once and closed before returning, whether or not
/// recording succeeded.
#[allow(clippy::too_many_arguments)]
pub fn ingest(
    store_config: &StoreConfig,
    sink: Arc<dyn EventSink>,
    emitter_config: EmitterConfig,
    job_namespace: &str,
    job_name: &str,
    inputs: Vec<String>,
    outputs: Vec<String>,
    out: &mut impl Write,
) -> CliResult<CommandStatus> {
    let store: Arc<dyn GraphStore> = Arc::from(graph::connect(store_config)?);

    let ingestor = LineageIngestor::new(
        LineageRecorder::new(store.clone()),
        RunEventEmitter::new(sink, emitter_config),
    );
    let result = ingestor.ingest_job(job_namespace, job_name, inputs, outputs);

    if let Err(e) = store.close() {
        warn!(event = %Event::StoreClosed, error = %e, "graph store did not close cleanly");
    }

    let report = result?;
    writeln!(out, "{}", report.summary_json())?;
    out.flush()?;
    Ok(CommandStatus::Success)
}

/// Evaluate gate rules against an evidence index.
///
/// Rules are loaded first; an invalid rule set fails before any evidence
/// is read.
pub fn check_gates(
    index_path: &Path,
    rules_path: &Path,
    evidence_root: Option<PathBuf>,
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<CommandStatus> {
    let rules = RuleSet::load(rules_path)?;
    info!(event = %Event::RulesLoaded, path = %rules_path.display(), rules = rules.len(), "gate rules loaded");
    let index = EvidenceIndex::load(index_path)?;
    info!(event = %Event::EvidenceLoaded, path = %index_path.display(), keys = index.len(), "evidence index loaded");

    let locator = match evidence_root {
        Some(root) => FileSystemLocator::with_root(root),
        None => FileSystemLocator::new(),
    };
    let verdict = GateEngine::with_locator(locator).evaluate(&index, &rules);

    match format {
        OutputFormat::Text => write!(out, "{}", verdict.render())?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&verdict)?)?,
    }
    out.flush()?;

    Ok(CommandStatus::from(&verdict))
}
