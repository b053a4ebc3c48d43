//! Gate rules and rule files
//!
//! Rule file (YAML, JSON also accepted):
//!
//! ```yaml
//! gates:
//!   - key: drift_report_html
//!     kind: existence
//!   - name: psi_bound
//!     key: drift.psi
//!     kind: threshold
//!     op: "<="
//!     threshold: 0.2
//!   - name: selection_rate_floor
//!     key: fairness.selection_rate_by_group
//!     kind: structured
//!     op: ">="
//!     threshold: 0.4
//!   - name: selection_rate_gap
//!     key: fairness.selection_rate_by_group
//!     kind: spread
//!     op: "<="
//!     threshold: 0.1
//! ```
//!
//! Rules are validated completely at load time and are immutable afterwards.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{GateError, GateResult};

/// Numeric comparator `evidence <op> threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparator {
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "==")]
    Eq,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Le => "<=",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Gt => ">",
            Comparator::Eq => "==",
        }
    }

    /// True when `value <op> threshold` holds. NaN never holds.
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Le => value <= threshold,
            Comparator::Ge => value >= threshold,
            Comparator::Lt => value < threshold,
            Comparator::Gt => value > threshold,
            Comparator::Eq => value == threshold,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" | "le" | "lte" => Ok(Comparator::Le),
            ">=" | "ge" | "gte" => Ok(Comparator::Ge),
            "<" | "lt" => Ok(Comparator::Lt),
            ">" | "gt" => Ok(Comparator::Gt),
            "==" | "=" | "eq" => Ok(Comparator::Eq),
            other => Err(format!("unknown comparator '{}'", other)),
        }
    }
}

/// What a rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Key maps to a location whose artifact exists.
    Existence,
    /// Key maps to a number satisfying the comparator.
    Threshold { op: Comparator, threshold: f64 },
    /// Every sub-value of a composite satisfies the comparator.
    Structured { op: Comparator, threshold: f64 },
    /// `max - min` over a composite's sub-values satisfies the comparator.
    Spread { op: Comparator, threshold: f64 },
}

impl Check {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Check::Existence => "existence",
            Check::Threshold { .. } => "threshold",
            Check::Structured { .. } => "structured",
            Check::Spread { .. } => "spread",
        }
    }
}

/// A named promotion rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateRule {
    pub name: String,
    /// Evidence key inspected; dotted paths reach into nested values.
    pub key: String,
    #[serde(flatten)]
    pub check: Check,
}

impl GateRule {
    pub fn existence(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            check: Check::Existence,
        }
    }

    pub fn new(name: impl Into<String>, key: impl Into<String>, check: Check) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            check,
        }
    }
}

/// Rule entry as written in the file, before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    name: Option<String>,
    key: Option<String>,
    #[serde(alias = "check")]
    kind: Option<String>,
    #[serde(alias = "comparator")]
    op: Option<String>,
    #[serde(alias = "expected")]
    threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRuleFile {
    gates: Vec<RawRule>,
}

/// Ordered, validated rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSet {
    rules: Vec<GateRule>,
}

impl RuleSet {
    /// Validates rules built in code.
    pub fn new(rules: Vec<GateRule>) -> GateResult<Self> {
        if rules.is_empty() {
            return Err(GateError::invalid_rule("<rule set>", "no gates defined"));
        }
        let mut names = HashSet::new();
        for rule in &rules {
            validate(rule)?;
            if !names.insert(rule.name.as_str()) {
                return Err(GateError::invalid_rule(&rule.name, "duplicate rule name"));
            }
        }
        Ok(Self { rules })
    }

    /// Reads and validates a rule file.
    pub fn load(path: impl AsRef<Path>) -> GateResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|cause| GateError::Io {
            path: path.display().to_string(),
            cause,
        })?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Parses rules from YAML text; `label` names the source in errors.
    pub fn from_yaml_str(content: &str, label: &str) -> GateResult<Self> {
        let raw: RawRuleFile = serde_yaml::from_str(content).map_err(|e| GateError::Parse {
            path: label.to_string(),
            message: e.to_string(),
        })?;

        let rules = raw
            .gates
            .into_iter()
            .enumerate()
            .map(|(position, raw)| resolve(position, raw))
            .collect::<GateResult<Vec<_>>>()?;
        Self::new(rules)
    }

    pub fn rules(&self) -> &[GateRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn resolve(position: usize, raw: RawRule) -> GateResult<GateRule> {
    let key = raw.key.map(|k| k.trim().to_string()).unwrap_or_default();
    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| {
            if key.is_empty() {
                format!("#{}", position + 1)
            } else {
                key.clone()
            }
        });

    let kind = raw
        .kind
        .ok_or_else(|| GateError::invalid_rule(&name, "missing check kind"))?;

    let comparison = |name: &str| -> GateResult<(Comparator, f64)> {
        let op = raw
            .op
            .as_deref()
            .ok_or_else(|| GateError::invalid_rule(name, "missing comparator (op)"))?
            .parse::<Comparator>()
            .map_err(|reason| GateError::invalid_rule(name, reason))?;
        let threshold = raw
            .threshold
            .ok_or_else(|| GateError::invalid_rule(name, "missing threshold"))?;
        Ok((op, threshold))
    };

    let check = match kind.trim().to_ascii_lowercase().as_str() {
        "existence" | "exists" => {
            if raw.op.is_some() || raw.threshold.is_some() {
                return Err(GateError::invalid_rule(
                    &name,
                    "existence check takes no comparator or threshold",
                ));
            }
            Check::Existence
        }
        "threshold" | "numeric" => {
            let (op, threshold) = comparison(&name)?;
            Check::Threshold { op, threshold }
        }
        "structured" | "each" => {
            let (op, threshold) = comparison(&name)?;
            Check::Structured { op, threshold }
        }
        "spread" => {
            let (op, threshold) = comparison(&name)?;
            Check::Spread { op, threshold }
        }
        other => {
            return Err(GateError::invalid_rule(
                &name,
                format!("unknown check kind '{}'", other),
            ))
        }
    };

    Ok(GateRule { name, key, check })
}

fn validate(rule: &GateRule) -> GateResult<()> {
    if rule.name.trim().is_empty() {
        return Err(GateError::invalid_rule(&rule.key, "rule name is empty"));
    }
    if rule.key.trim().is_empty() {
        return Err(GateError::invalid_rule(&rule.name, "evidence key is empty"));
    }
    match rule.check {
        Check::Existence => Ok(()),
        Check::Threshold { threshold, .. }
        | Check::Structured { threshold, .. }
        | Check::Spread { threshold, .. } => {
            if threshold.is_finite() {
                Ok(())
            } else {
                Err(GateError::invalid_rule(&rule.name, "threshold must be finite"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(yaml: &str) -> GateResult<RuleSet> {
        RuleSet::from_yaml_str(yaml, "test.yml")
    }

    fn invalid_reason(yaml: &str) -> String {
        match load(yaml) {
            Err(GateError::InvalidRule { reason, .. }) => reason,
            other => panic!("expected InvalidRule, got {:?}", other),
        }
    }

    #[test]
    fn test_load_all_kinds() {
        let rules = load(
            r#"
gates:
  - key: drift_report_html
    kind: existence
  - name: psi_bound
    key: drift.psi
    kind: threshold
    op: "<="
    threshold: 0.2
  - name: rate_floor
    key: fairness.selection_rate_by_group
    check: each
    op: ">="
    expected: 0.4
  - name: rate_gap
    key: fairness.selection_rate_by_group
    kind: spread
    op: lt
    threshold: 0.1
"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 4);
        assert_eq!(rules.rules()[0], GateRule::existence("drift_report_html"));
        assert_eq!(
            rules.rules()[1].check,
            Check::Threshold {
                op: Comparator::Le,
                threshold: 0.2
            }
        );
        assert_eq!(rules.rules()[2].check.kind_name(), "structured");
        assert_eq!(
            rules.rules()[3].check,
            Check::Spread {
                op: Comparator::Lt,
                threshold: 0.1
            }
        );
    }

    #[test]
    fn test_json_is_accepted() {
        let rules = load(r#"{"gates": [{"key": "shap_values", "kind": "existence"}]}"#).unwrap();
        assert_eq!(rules.rules()[0].name, "shap_values");
    }

    #[test]
    fn test_unknown_kind() {
        let reason = invalid_reason("gates:\n  - key: a\n    kind: vibes\n");
        assert!(reason.contains("unknown check kind 'vibes'"));
    }

    #[test]
    fn test_missing_threshold() {
        let reason = invalid_reason("gates:\n  - key: a\n    kind: threshold\n    op: '<='\n");
        assert_eq!(reason, "missing threshold");
    }

    #[test]
    fn test_missing_comparator() {
        let reason = invalid_reason("gates:\n  - key: a\n    kind: structured\n    threshold: 1\n");
        assert!(reason.contains("missing comparator"));
    }

    #[test]
    fn test_bad_comparator() {
        let reason = invalid_reason("gates:\n  - key: a\n    kind: threshold\n    op: '~'\n    threshold: 1\n");
        assert!(reason.contains("unknown comparator"));
    }

    #[test]
    fn test_missing_kind_and_key() {
        assert_eq!(invalid_reason("gates:\n  - key: a\n"), "missing check kind");
        assert_eq!(
            invalid_reason("gates:\n  - kind: existence\n"),
            "evidence key is empty"
        );
    }

    #[test]
    fn test_existence_rejects_threshold() {
        let reason = invalid_reason("gates:\n  - key: a\n    kind: exists\n    threshold: 1\n");
        assert!(reason.contains("takes no comparator"));
    }

    #[test]
    fn test_duplicate_names() {
        let reason = invalid_reason(
            "gates:\n  - key: a\n    kind: exists\n  - key: a\n    kind: exists\n",
        );
        assert_eq!(reason, "duplicate rule name");
    }

    #[test]
    fn test_empty_rule_set() {
        assert_eq!(invalid_reason("gates: []\n"), "no gates defined");
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let err = load("gates:\n  - key: a\n    kind: threshold\n    op: '<'\n    treshold: 1\n")
            .unwrap_err();
        assert!(matches!(err, GateError::Parse { .. }));
    }

    #[test]
    fn test_non_finite_threshold() {
        let reason = invalid_reason("gates:\n  - key: a\n    kind: threshold\n    op: '<'\n    threshold: .nan\n");
        assert_eq!(reason, "threshold must be finite");
    }

    #[test]
    fn test_comparator_semantics() {
        assert!(Comparator::Le.holds(0.2, 0.2));
        assert!(!Comparator::Lt.holds(0.2, 0.2));
        assert!(Comparator::Ge.holds(0.5, 0.4));
        assert!(!Comparator::Gt.holds(0.4, 0.4));
        assert!(Comparator::Eq.holds(1.0, 1.0));
        assert!(!Comparator::Le.holds(f64::NAN, 1.0));
    }
}
