//! # Event Sinks
//!
//! `EventSink` is the delivery capability handed to the emitter. An
//! unconfigured deployment gets `NullEventSink` rather than a branch at
//! every call site.

use std::fmt::Debug;

use reqwest::blocking::Client;
use url::Url;

use super::config::SinkConfig;
use super::errors::{SinkError, SinkResult};
use super::event::RunEvent;

/// Delivers run events to an external observer.
pub trait EventSink: Send + Sync + Debug {
    /// Delivers one event. No retries.
    fn send(&self, event: &RunEvent) -> SinkResult<()>;

    /// False for sinks that drop everything.
    fn is_configured(&self) -> bool {
        true
    }

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Sink used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: &RunEvent) -> SinkResult<()> {
        Err(SinkError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

/// POSTs events as JSON to an OpenLineage-compatible HTTP endpoint.
#[derive(Debug)]
pub struct HttpEventSink {
    client: Client,
    url: Url,
    api_key: Option<String>,
}

impl HttpEventSink {
    pub fn new(config: &SinkConfig) -> SinkResult<Self> {
        let base = config.url.as_deref().ok_or(SinkError::NotConfigured)?;
        let url = endpoint_url(base, &config.endpoint)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| SinkError::InvalidConfig(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
        })
    }
}

impl EventSink for HttpEventSink {
    fn send(&self, event: &RunEvent) -> SinkResult<()> {
        let body = serde_json::to_vec(event).map_err(|e| SinkError::Encode(e.to_string()))?;

        let mut request = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| SinkError::Unavailable(format!("{}: {}", self.url, e)))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(512).collect(),
        })
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Picks the sink for `config`: HTTP when active, null otherwise.
pub fn build_sink(config: &SinkConfig) -> SinkResult<Box<dyn EventSink>> {
    if !config.is_active() {
        return Ok(Box::new(NullEventSink));
    }
    Ok(Box::new(HttpEventSink::new(config)?))
}

fn endpoint_url(base: &str, endpoint: &str) -> SinkResult<Url> {
    let mut base = Url::parse(base)
        .map_err(|e| SinkError::InvalidConfig(format!("invalid sink URL '{}': {}", base, e)))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(SinkError::InvalidConfig(format!(
            "sink URL must be http or https, got '{}'",
            base.scheme()
        )));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(endpoint.trim_start_matches('/'))
        .map_err(|e| SinkError::InvalidConfig(format!("invalid sink endpoint '{}': {}", endpoint, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_join() {
        let url = endpoint_url("http://localhost:5000", "api/v1/lineage").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/v1/lineage");

        let url = endpoint_url("https://marquez.example.com/base", "/api/v1/lineage").unwrap();
        assert_eq!(url.as_str(), "https://marquez.example.com/base/api/v1/lineage");
    }

    #[test]
    fn test_endpoint_url_rejects_scheme() {
        assert!(endpoint_url("ftp://host", "api").is_err());
        assert!(endpoint_url("not a url", "api").is_err());
    }

    #[test]
    fn test_build_sink_defaults_to_null() {
        let sink = build_sink(&SinkConfig::default()).unwrap();
        assert!(!sink.is_configured());
    }

    #[test]
    fn test_build_sink_http() {
        let config = SinkConfig {
            url: Some("http://localhost:5000".into()),
            ..SinkConfig::default()
        };
        let sink = build_sink(&config).unwrap();
        assert!(sink.is_configured());
        assert_eq!(sink.describe(), "http://localhost:5000/api/v1/lineage");
    }
}
