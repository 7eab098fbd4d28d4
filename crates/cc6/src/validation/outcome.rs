//! Results of rule evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity level of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only ("suggested" in host terms).
    Info,
    /// Recommended practice.
    Warning,
    /// Required by the convention.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }

    /// Host priority level: 3 required, 2 recommended, 1 suggested.
    pub fn host_level(&self) -> u8 {
        match self {
            Severity::Info => 1,
            Severity::Warning => 2,
            Severity::Error => 3,
        }
    }
}

/// Outcome of one rule on one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// The check holds.
    Pass,
    /// An error-severity check does not hold.
    Fail,
    /// A warning- or info-severity check does not hold.
    Warn,
    /// The check could not run (missing prerequisite or CV gap).
    Skip,
}

impl Disposition {
    /// Whether the result counts towards a group's total.
    pub fn is_scored(&self) -> bool {
        !matches!(self, Disposition::Skip)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Disposition::Pass => "pass",
            Disposition::Fail => "fail",
            Disposition::Warn => "warn",
            Disposition::Skip => "skip",
        };
        write!(f, "{}", label)
    }
}

/// The instance a result is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "target", content = "name")]
pub enum Target {
    /// The dataset as a whole (global attributes, file facts).
    Global,
    /// A variable.
    Variable(String),
    /// A dimension.
    Dimension(String),
    /// A single attribute of a CV-provided list.
    Attribute(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Global => write!(f, "global"),
            Target::Variable(name) => write!(f, "variable '{}'", name),
            Target::Dimension(name) => write!(f, "dimension '{}'", name),
            Target::Attribute(name) => write!(f, "attribute '{}'", name),
        }
    }
}

/// The immutable result of evaluating one rule on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    rule_id: String,
    group: String,
    target: Target,
    severity: Severity,
    disposition: Disposition,
    message: String,
}

impl RuleResult {
    /// Create a result.
    pub fn new(
        rule_id: impl Into<String>,
        group: impl Into<String>,
        target: Target,
        severity: Severity,
        disposition: Disposition,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            group: group.into(),
            target,
            severity,
            disposition,
            message: message.into(),
        }
    }

    /// Id of the rule that produced this result.
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Report group of the rule.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The evaluated instance.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Severity declared on the rule.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Outcome.
    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the check held.
    pub fn passed(&self) -> bool {
        self.disposition == Disposition::Pass
    }
}
