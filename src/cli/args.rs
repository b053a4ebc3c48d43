//! CLI argument definitions using clap
//!
//! Commands:
//! - trustgate ingest --store-uri <uri> --job-namespace <ns> --job-name <name> [--input D]... [--output D]...
//! - trustgate check-gates <index> <rules> [--evidence-root <dir>] [--format text|json]

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::graph::DEFAULT_DATABASE;

/// trustgate - dataset lineage ingestion and promotion gates
#[derive(Parser, Debug)]
#[command(name = "trustgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a job run's lineage and emit its run event
    Ingest {
        /// Graph store URI (http(s)://, file://, memory://)
        #[arg(long, env = "TRUSTGATE_STORE_URI")]
        store_uri: String,

        #[arg(long, env = "TRUSTGATE_STORE_USER")]
        store_user: String,

        #[arg(long, env = "TRUSTGATE_STORE_PASS", hide_env_values = true)]
        store_pass: String,

        #[arg(long, env = "TRUSTGATE_STORE_DATABASE", default_value = DEFAULT_DATABASE)]
        store_database: String,

        /// Per-request store timeout in seconds
        #[arg(long, default_value_t = 10)]
        store_timeout_secs: u64,

        /// Logical owner of the job
        #[arg(long)]
        job_namespace: String,

        #[arg(long)]
        job_name: String,

        /// Input dataset (repeatable)
        #[arg(long = "input")]
        inputs: Vec<String>,

        /// Output dataset (repeatable)
        #[arg(long = "output")]
        outputs: Vec<String>,

        /// Namespace for dataset refs in the run event (defaults to the job namespace)
        #[arg(long)]
        dataset_namespace: Option<String>,

        /// Producer URI stamped on the run event
        #[arg(long)]
        producer: Option<String>,
    },

    /// Evaluate promotion gates against an evidence index
    CheckGates {
        /// Evidence index JSON file
        index: PathBuf,

        /// Gate rules YAML file
        rules: PathBuf,

        /// Directory relative artifact locations resolve against
        #[arg(long)]
        evidence_root: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Verdict output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Parse `args` without exiting
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::try_parse_args([
            "trustgate",
            "ingest",
            "--store-uri",
            "memory://",
            "--store-user",
            "neo4j",
            "--store-pass",
            "pw",
            "--job-namespace",
            "emm",
            "--job-name",
            "train",
            "--input",
            "raw",
            "--input",
            "ref",
            "--output",
            "model",
        ])
        .unwrap();

        match cli.command {
            Command::Ingest {
                inputs,
                outputs,
                store_database,
                store_timeout_secs,
                ..
            } => {
                assert_eq!(inputs, vec!["raw", "ref"]);
                assert_eq!(outputs, vec!["model"]);
                assert_eq!(store_database, "neo4j");
                assert_eq!(store_timeout_secs, 10);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_check_gates() {
        let cli = Cli::try_parse_args([
            "trustgate",
            "check-gates",
            "index.json",
            "gates.yml",
            "--format",
            "json",
            "--log-json",
        ])
        .unwrap();

        assert!(cli.log_json);
        match cli.command {
            Command::CheckGates {
                index,
                rules,
                evidence_root,
                format,
            } => {
                assert_eq!(index, PathBuf::from("index.json"));
                assert_eq!(rules, PathBuf::from("gates.yml"));
                assert_eq!(evidence_root, None);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ingest_requires_credentials() {
        let err = Cli::try_parse_args([
            "trustgate",
            "ingest",
            "--store-uri",
            "memory://",
            "--store-user",
            "neo4j",
            "--job-namespace",
            "emm",
            "--job-name",
            "train",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_check_gates_requires_both_files() {
        assert!(Cli::try_parse_args(["trustgate", "check-gates", "index.json"]).is_err());
    }
}
