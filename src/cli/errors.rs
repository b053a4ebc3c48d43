//! CLI-specific error types
//!
//! Every CLI error is fatal for the invocation and exits with status 1.
//! Gate violations are not errors; they are a verdict (exit 2).

use std::fmt;
use std::io;

use crate::evidence::EvidenceError;
use crate::gate::GateError;
use crate::graph::GraphError;
use crate::lineage::LineageError;

/// Exit status for any CLI error.
pub const EXIT_ERROR: u8 = 1;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Bad arguments
    Usage,
    /// Store URI or sink settings unusable
    ConfigError,
    /// Graph store unreachable or failing
    StoreError,
    /// Lineage recording failed
    LineageError,
    /// Rule file unreadable or invalid
    RulesError,
    /// Evidence index unreadable or invalid
    EvidenceError,
    /// I/O error (stdout)
    IoError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usage => "TRUSTGATE_CLI_USAGE",
            Self::ConfigError => "TRUSTGATE_CLI_CONFIG_ERROR",
            Self::StoreError => "TRUSTGATE_CLI_STORE_ERROR",
            Self::LineageError => "TRUSTGATE_CLI_LINEAGE_ERROR",
            Self::RulesError => "TRUSTGATE_CLI_RULES_ERROR",
            Self::EvidenceError => "TRUSTGATE_CLI_EVIDENCE_ERROR",
            Self::IoError => "TRUSTGATE_CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::Usage, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        EXIT_ERROR
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<GraphError> for CliError {
    fn from(e: GraphError) -> Self {
        let code = match e {
            GraphError::InvalidConfig(_) => CliErrorCode::ConfigError,
            _ => CliErrorCode::StoreError,
        };
        Self::new(code, format!("[{}] {}", e.code(), e))
    }
}

impl From<LineageError> for CliError {
    fn from(e: LineageError) -> Self {
        let code = match e {
            LineageError::InvalidRun(_) => CliErrorCode::Usage,
            _ => CliErrorCode::LineageError,
        };
        Self::new(code, format!("[{}] {}", e.code(), e))
    }
}

impl From<GateError> for CliError {
    fn from(e: GateError) -> Self {
        Self::new(CliErrorCode::RulesError, e.to_string())
    }
}

impl From<EvidenceError> for CliError {
    fn from(e: EvidenceError) -> Self {
        Self::new(CliErrorCode::EvidenceError, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
