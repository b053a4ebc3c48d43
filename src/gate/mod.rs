//! # Governance Gate
//!
//! Decides whether an evaluation cycle may be promoted. A declarative rule
//! set is checked against the evidence index; the verdict passes only when
//! every rule holds.
//!
//! The gate fails closed: missing evidence, unreadable values and
//! unresolvable artifacts are all violations. A rule file that cannot be
//! loaded is an error, never a pass.

mod engine;
mod errors;
mod rule;
mod verdict;

pub use engine::GateEngine;
pub use errors::{GateError, GateResult};
pub use rule::{Check, Comparator, GateRule, RuleSet};
pub use verdict::{GateVerdict, Violation, EXIT_PASSED, EXIT_VIOLATED};
