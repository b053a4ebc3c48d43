//! # Evidence Index
//!
//! Named evaluation artifacts (drift report, explainability values, fairness
//! summary) mapped to their storage locations or computed values. Produced
//! once per evaluation cycle by the metrics producer; read-only to the gate.

mod errors;
mod index;
mod locator;

pub use errors::{EvidenceError, EvidenceResult};
pub use index::EvidenceIndex;
pub use locator::{ArtifactLocator, FileSystemLocator, Resolution};
