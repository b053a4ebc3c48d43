//! Gate evaluation
//!
//! Evaluation is:
//! - Complete: every rule runs, no short-circuit on the first failure
//! - Deterministic: same index and rules give the same violations, in the
//!   same order (rule order, then sorted sub-keys)
//! - Fail closed: absent, malformed or unresolvable evidence is a violation

use serde_json::Value;
use tracing::{info, warn};

use super::rule::{Check, Comparator, GateRule, RuleSet};
use super::verdict::{GateVerdict, Violation};
use crate::evidence::{ArtifactLocator, EvidenceIndex, FileSystemLocator, Resolution};
use crate::observability::Event;

/// Evaluates rule sets against evidence indexes.
#[derive(Debug, Clone, Default)]
pub struct GateEngine<L = FileSystemLocator> {
    locator: L,
}

impl GateEngine<FileSystemLocator> {
    /// Engine resolving artifacts on the local filesystem.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: ArtifactLocator> GateEngine<L> {
    pub fn with_locator(locator: L) -> Self {
        Self { locator }
    }

    /// Checks every rule and collects all violations.
    pub fn evaluate(&self, index: &EvidenceIndex, rules: &RuleSet) -> GateVerdict {
        let mut violations = Vec::new();
        for rule in rules.rules() {
            let before = violations.len();
            self.check_rule(index, rule, &mut violations);
            for violation in &violations[before..] {
                warn!(
                    event = %Event::GateViolation,
                    rule = %violation.rule,
                    key = %rule.key,
                    kind = rule.check.kind_name(),
                    "{}",
                    violation.reason
                );
            }
        }

        let verdict = GateVerdict::new(rules.len(), violations);
        info!(
            event = %Event::GateEvaluated,
            rules = verdict.rules_evaluated(),
            violations = verdict.violations().len(),
            passed = verdict.passed(),
            "gate evaluated"
        );
        verdict
    }

    fn check_rule(&self, index: &EvidenceIndex, rule: &GateRule, out: &mut Vec<Violation>) {
        let evidence = index.get(&rule.key);
        match rule.check {
            Check::Existence => self.check_existence(rule, evidence, out),
            Check::Threshold { op, threshold } => check_threshold(rule, evidence, op, threshold, out),
            Check::Structured { op, threshold } => check_structured(rule, evidence, op, threshold, out),
            Check::Spread { op, threshold } => check_spread(rule, evidence, op, threshold, out),
        }
    }

    fn check_existence(&self, rule: &GateRule, evidence: Option<&Value>, out: &mut Vec<Violation>) {
        let missing = || Violation::new(&rule.name, format!("Missing {} artifact", rule.key));
        let location = match evidence {
            None => return out.push(missing()),
            Some(Value::String(location)) => location,
            Some(_) => {
                return out.push(Violation::new(
                    &rule.name,
                    format!("Evidence {} is not an artifact location", rule.key),
                ))
            }
        };

        match self.locator.resolve(location) {
            Resolution::Present(_) => {}
            Resolution::Absent(_) | Resolution::Empty => out.push(missing()),
            Resolution::Unsupported(scheme) => out.push(Violation::new(
                &rule.name,
                format!(
                    "Missing {} artifact (cannot resolve '{}' locations)",
                    rule.key, scheme
                ),
            )),
        }
    }
}

fn check_threshold(
    rule: &GateRule,
    evidence: Option<&Value>,
    op: Comparator,
    threshold: f64,
    out: &mut Vec<Violation>,
) {
    let Some(value) = evidence else {
        return out.push(Violation::new(&rule.name, format!("Missing {} evidence", rule.key)));
    };
    let Some(number) = value.as_f64() else {
        return out.push(Violation::new(
            &rule.name,
            format!("Evidence {} is not numeric", rule.key),
        ));
    };
    if !op.holds(number, threshold) {
        out.push(Violation::new(
            &rule.name,
            format!("{} = {} violates {} {}", rule.key, number, op, threshold),
        ));
    }
}

/// Sub-values of composite evidence, keyed by name or position.
fn sub_values<'a>(
    rule: &GateRule,
    evidence: Option<&'a Value>,
    out: &mut Vec<Violation>,
) -> Option<Vec<(String, &'a Value)>> {
    let entries: Vec<(String, &Value)> = match evidence {
        None => {
            out.push(Violation::new(&rule.name, format!("Missing {} evidence", rule.key)));
            return None;
        }
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Some(_) => {
            out.push(Violation::new(
                &rule.name,
                format!("Evidence {} is not a composite value", rule.key),
            ));
            return None;
        }
    };
    if entries.is_empty() {
        out.push(Violation::new(
            &rule.name,
            format!("Evidence {} has no sub-values", rule.key),
        ));
        return None;
    }
    Some(entries)
}

fn check_structured(
    rule: &GateRule,
    evidence: Option<&Value>,
    op: Comparator,
    threshold: f64,
    out: &mut Vec<Violation>,
) {
    let Some(entries) = sub_values(rule, evidence, out) else {
        return;
    };
    for (sub_key, value) in entries {
        match value.as_f64() {
            Some(number) if op.holds(number, threshold) => {}
            Some(number) => out.push(Violation::new(
                &rule.name,
                format!(
                    "{}[{}] = {} violates {} {}",
                    rule.key, sub_key, number, op, threshold
                ),
            )),
            None => out.push(Violation::new(
                &rule.name,
                format!("{}[{}] is not numeric", rule.key, sub_key),
            )),
        }
    }
}

fn check_spread(
    rule: &GateRule,
    evidence: Option<&Value>,
    op: Comparator,
    threshold: f64,
    out: &mut Vec<Violation>,
) {
    let Some(entries) = sub_values(rule, evidence, out) else {
        return;
    };

    let mut numbers = Vec::with_capacity(entries.len());
    let mut malformed = false;
    for (sub_key, value) in entries {
        match value.as_f64() {
            Some(number) => numbers.push(number),
            None => {
                malformed = true;
                out.push(Violation::new(
                    &rule.name,
                    format!("{}[{}] is not numeric", rule.key, sub_key),
                ));
            }
        }
    }
    if malformed {
        return;
    }

    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let spread = max - min;
    if !op.holds(spread, threshold) {
        out.push(Violation::new(
            &rule.name,
            format!("{} spread = {} violates {} {}", rule.key, spread, op, threshold),
        ));
    }
}
