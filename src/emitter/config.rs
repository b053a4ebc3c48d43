//! Event sink and emitter settings
//!
//! Sink settings follow the OpenLineage client environment conventions:
//! - `OPENLINEAGE_URL`: sink base URL; unset means no sink
//! - `OPENLINEAGE_API_KEY`: optional bearer token
//! - `OPENLINEAGE_ENDPOINT`: path under the base URL (default `api/v1/lineage`)
//! - `OPENLINEAGE_DISABLED`: `true`/`1` turns emission off
//! - `OPENLINEAGE_TIMEOUT`: request timeout in seconds (default 5)

use std::fmt;
use std::time::Duration;

use super::errors::{SinkError, SinkResult};

pub const DEFAULT_ENDPOINT: &str = "api/v1/lineage";
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PRODUCER: &str = "https://github.com/datatrustengineering/trustgate";

/// Where run events are delivered.
#[derive(Clone, PartialEq)]
pub struct SinkConfig {
    pub url: Option<String>,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub disabled: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout: DEFAULT_SINK_TIMEOUT,
            disabled: false,
        }
    }
}

impl SinkConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> SinkResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, so callers can supply any source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SinkResult<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match non_empty("OPENLINEAGE_TIMEOUT") {
            Some(raw) => {
                let secs: f64 = raw.trim().parse().map_err(|_| {
                    SinkError::InvalidConfig(format!("OPENLINEAGE_TIMEOUT '{}' is not a number", raw))
                })?;
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(SinkError::InvalidConfig(
                        "OPENLINEAGE_TIMEOUT must be > 0".into(),
                    ));
                }
                Duration::try_from_secs_f64(secs).map_err(|e| {
                    SinkError::InvalidConfig(format!("OPENLINEAGE_TIMEOUT '{}': {}", raw, e))
                })?
            }
            None => DEFAULT_SINK_TIMEOUT,
        };

        let disabled = non_empty("OPENLINEAGE_DISABLED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            url: non_empty("OPENLINEAGE_URL").map(|u| u.trim().to_string()),
            endpoint: non_empty("OPENLINEAGE_ENDPOINT")
                .map(|e| e.trim().to_string())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: non_empty("OPENLINEAGE_API_KEY"),
            timeout,
            disabled,
        })
    }

    /// True when events should be sent somewhere.
    pub fn is_active(&self) -> bool {
        !self.disabled && self.url.is_some()
    }
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("url", &self.url)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("disabled", &self.disabled)
            .finish()
    }
}

/// How events are labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    /// `producer` field of every event.
    pub producer: String,
    /// Namespace for dataset references; `None` means the job namespace.
    pub dataset_namespace: Option<String>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            producer: DEFAULT_PRODUCER.to_string(),
            dataset_namespace: None,
        }
    }
}
