//! Observability for trustgate
//!
//! Logging goes through `tracing`; this module owns the subscriber setup
//! and the event vocabulary.
//!
//! ```ignore
//! use tracing::info;
//! use trustgate::observability::Event;
//!
//! info!(event = %Event::EdgeLinked, source = "a", target = "b", "linked");
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{init, LogFormat, LOG_ENV};
