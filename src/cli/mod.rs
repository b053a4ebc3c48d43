//! CLI module for trustgate
//!
//! Provides command-line interface for:
//! - ingest: record a job run's lineage and emit its run event
//! - check-gates: evaluate promotion gates against an evidence index

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, OutputFormat};
pub use commands::{check_gates, ingest, run, run_command, run_from, CommandStatus};
pub use errors::{CliError, CliErrorCode, CliResult, EXIT_ERROR};
