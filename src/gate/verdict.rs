//! Gate verdicts

use std::fmt;

use serde::Serialize;

/// Exit code for a passing verdict.
pub const EXIT_PASSED: u8 = 0;
/// Exit code for a verdict with violations.
pub const EXIT_VIOLATED: u8 = 2;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Rule that produced it.
    pub rule: String,
    /// Human readable reason.
    pub reason: String,
}

impl Violation {
    pub fn new(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.reason)
    }
}

/// Result of one evaluation. Passes iff there are no violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateVerdict {
    passed: bool,
    rules_evaluated: usize,
    violations: Vec<Violation>,
}

impl GateVerdict {
    pub fn new(rules_evaluated: usize, violations: Vec<Violation>) -> Self {
        Self {
            passed: violations.is_empty(),
            rules_evaluated,
            violations,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn rules_evaluated(&self) -> usize {
        self.rules_evaluated
    }

    /// Violations in rule order, then sub-key order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn reasons(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.reason.as_str()).collect()
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed {
            EXIT_PASSED
        } else {
            EXIT_VIOLATED
        }
    }

    /// Plain-text report.
    pub fn render(&self) -> String {
        if self.passed {
            return "GATES PASSED\n".to_string();
        }
        let mut out = String::from("GATES FAILED:\n");
        for violation in &self.violations {
            out.push_str(" - ");
            out.push_str(&violation.to_string());
            out.push('\n');
        }
        out
    }
}
