//! Declarative rule records.

use serde::{Deserialize, Serialize};

use crate::error::{Cc6Error, Result};
use crate::validation::Severity;

use super::template::PathTemplate;

/// Which variable(s) a variable-scoped rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "select", content = "name")]
pub enum VariableSelector {
    /// The data variable identified for the check.
    Data,
    /// A variable by name (e.g. `time`).
    Named(String),
    /// Every variable in the dataset.
    All,
}

/// What a rule is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "variable")]
pub enum Scope {
    /// The global attributes.
    Global,
    /// One or more variables.
    Variable(VariableSelector),
    /// Every dataset dimension.
    Dimension,
}

/// The value a membership check inspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Subject {
    /// An attribute of the target.
    Attribute(String),
    /// The name of the target variable or dimension.
    Name,
}

/// Where allowed values come from. Multiple sources are unioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum AllowedSource {
    /// The allowed values of one CV node.
    Cv { path: PathTemplate },
    /// One field collected from every entry of a CV map
    /// (e.g. `out_name` of every `axis_entry`).
    CvField { map: PathTemplate, field: String },
    /// Names referenced by an attribute (e.g. `bounds`, `grid_mapping`) on
    /// the variables selected by `by`.
    Referenced {
        attribute: String,
        #[serde(default)]
        by: ReferencedBy,
    },
    /// Names of every CV-known data variable found in the dataset.
    DataVariable,
}

impl AllowedSource {
    /// Whether the values come from the CV alone.
    pub fn is_cv(&self) -> bool {
        matches!(self, AllowedSource::Cv { .. } | AllowedSource::CvField { .. })
    }
}

/// Which variables may contribute names to an [`AllowedSource::Referenced`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencedBy {
    /// Every variable in the dataset.
    #[default]
    Any,
    /// Only the data variable.
    DataVariable,
    /// Only variables whose names the rule's CV sources allow.
    KnownVariable,
}

/// Where a pattern comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "value")]
pub enum PatternSource {
    /// A regex written in the rule.
    Literal(String),
    /// A POSIX regex (or list of alternatives) stored in the CV.
    Cv(PathTemplate),
}

/// One side of an equality check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "operand", content = "value")]
pub enum Operand {
    /// A global attribute.
    Global(String),
    /// An attribute of the data variable.
    DataAttribute(String),
    /// The data variable's name.
    DataVariableName,
    /// A CV node (a leaf, or any member of a set/map).
    Cv(PathTemplate),
}

/// Predicates over several attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "consistency")]
pub enum Consistency {
    /// The CV entry keyed by global attribute `key` (optionally its `field`)
    /// must allow the value of global attribute `value`.
    Paired {
        key: String,
        value: String,
        entries: PathTemplate,
        #[serde(default)]
        field: Option<String>,
    },
    /// Two operands must agree.
    Equals { left: Operand, right: Operand },
    /// The `frequency` attribute must match the spacing of the time coordinate.
    TimeSpacing { frequency: String, time: String },
    /// The time coordinate must cover the whole years one file holds at the
    /// frequency, stamped according to `cell_methods`.
    TimeChunking {
        frequency: String,
        time: String,
        cell_methods: Operand,
    },
}

/// Value normalization applied before membership comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalization {
    /// Strip surrounding whitespace.
    pub trim: bool,
    /// Compare case-insensitively.
    pub fold_case: bool,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            trim: true,
            fold_case: false,
        }
    }
}

/// The kind of check a rule performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Check {
    /// The attribute must exist on the target.
    Presence { attribute: String },
    /// Every attribute listed at a CV path must exist (one result each).
    RequiredAttributes { list: PathTemplate },
    /// The subject must be an exact member of the allowed values.
    Membership {
        subject: Subject,
        allowed: Vec<AllowedSource>,
        #[serde(default)]
        normalization: Normalization,
    },
    /// The attribute must fully match a regex.
    Pattern {
        attribute: String,
        pattern: PatternSource,
    },
    /// A predicate over several attributes.
    CrossConsistency(Consistency),
    /// The variable's dimensions must follow a CV template.
    Shape {
        template: PathTemplate,
        #[serde(default)]
        axes: Vec<PathTemplate>,
    },
    /// Exactly one CV-known data variable must be present.
    DataVariable,
    /// Each dimension must have a coordinate variable of the same name.
    CoordinateVariable {
        #[serde(default)]
        exempt: Vec<String>,
    },
    /// The data variable should be deflated at `deflate_level` with shuffle.
    Compression { deflate_level: i64, shuffle: bool },
    /// The file must use the given data model and disk format.
    FileFormat {
        data_model: String,
        disk_format: String,
    },
}

impl Check {
    /// Short kind label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Check::Presence { .. } => "presence",
            Check::RequiredAttributes { .. } => "required_attributes",
            Check::Membership { .. } => "membership",
            Check::Pattern { .. } => "pattern",
            Check::CrossConsistency(_) => "cross_consistency",
            Check::Shape { .. } => "shape",
            Check::DataVariable => "data_variable",
            Check::CoordinateVariable { .. } => "coordinate_variable",
            Check::Compression { .. } => "compression",
            Check::FileFormat { .. } => "file_format",
        }
    }
}

/// Something that must hold before a rule is evaluated.
///
/// When it does not, every result of the rule is `skip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "requires", content = "name")]
pub enum Prerequisite {
    /// A global attribute must be present.
    Attribute(String),
    /// Another rule must have passed on every target.
    Rule(String),
}

/// A declarative unit of validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier.
    pub id: String,
    /// Report group name (e.g. "Global Attributes").
    pub group: String,
    /// What the rule is evaluated against.
    pub scope: Scope,
    /// The check to run.
    pub check: Check,
    /// How serious a failure is.
    pub severity: Severity,
    /// Conditions that must hold first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<Prerequisite>,
}

impl Rule {
    /// Create an error-severity rule without prerequisites.
    pub fn new(id: impl Into<String>, group: impl Into<String>, scope: Scope, check: Check) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            scope,
            check,
            severity: Severity::Error,
            prerequisites: Vec::new(),
        }
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Require a global attribute to be present.
    pub fn requires_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.prerequisites
            .push(Prerequisite::Attribute(attribute.into()));
        self
    }

    /// Require another rule to have passed.
    pub fn requires_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.prerequisites.push(Prerequisite::Rule(rule_id.into()));
        self
    }
}

/// An ordered collection of rules.
///
/// Order is significant: rules run in declaration order so result ordering
/// is stable across runs. Deserialization goes through [`RuleSet::new`], so
/// every rule set in memory has unique ids and acyclic prerequisites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rule>", into = "Vec<Rule>")]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl TryFrom<Vec<Rule>> for RuleSet {
    type Error = Cc6Error;

    fn try_from(rules: Vec<Rule>) -> Result<Self> {
        Self::new(rules)
    }
}

impl From<RuleSet> for Vec<Rule> {
    fn from(set: RuleSet) -> Self {
        set.rules
    }
}

impl RuleSet {
    /// Build a rule set, validating ids and prerequisite references.
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        let set = Self { rules };
        set.validate()?;
        Ok(set)
    }

    /// Build a rule set without validation.
    #[cfg(test)]
    pub(crate) fn unchecked(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse a rule set from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// All rules, in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by id.
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Group names, in order of first appearance.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !groups.contains(&rule.group.as_str()) {
                groups.push(&rule.group);
            }
        }
        groups
    }

    /// Rules of one group, in declaration order.
    pub fn in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |r| r.group == group)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn validate(&self) -> Result<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.id.is_empty() {
                return Err(Cc6Error::Config(format!("rule #{} has an empty id", index)));
            }
            if self.rules[..index].iter().any(|r| r.id == rule.id) {
                return Err(Cc6Error::Config(format!("duplicate rule id '{}'", rule.id)));
            }
            for prerequisite in &rule.prerequisites {
                if let Prerequisite::Rule(required) = prerequisite {
                    if !self.rules[..index].iter().any(|r| &r.id == required) {
                        return Err(Cc6Error::Config(format!(
                            "rule '{}' requires '{}', which is not declared before it",
                            rule.id, required
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(id: &str, attribute: &str) -> Rule {
        Rule::new(
            id,
            "Global Attributes",
            Scope::Global,
            Check::Presence {
                attribute: attribute.into(),
            },
        )
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = RuleSet::new(vec![presence("a", "x"), presence("a", "y")]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_prerequisite_must_be_declared_first() {
        let rules = vec![presence("b", "y").requires_rule("a"), presence("a", "x")];
        assert!(RuleSet::new(rules).is_err());

        let rules = vec![presence("a", "x"), presence("b", "y").requires_rule("a")];
        assert!(RuleSet::new(rules).is_ok());
    }

    #[test]
    fn test_groups_in_order() {
        let mut other = presence("c", "z");
        other.group = "Consistency".into();
        let set = RuleSet::new(vec![presence("a", "x"), other, presence("b", "y")]).unwrap();
        assert_eq!(set.groups(), vec!["Global Attributes", "Consistency"]);
        assert_eq!(set.in_group("Global Attributes").count(), 2);
    }

    #[test]
    fn test_rules_from_json() {
        let json = r#"[
            {
                "id": "frequency_valid",
                "group": "Global Attributes",
                "scope": {"scope": "global"},
                "check": {
                    "kind": "membership",
                    "subject": {"kind": "attribute", "name": "frequency"},
                    "allowed": [{"source": "cv", "path": "CV.CV.frequency"}]
                },
                "severity": "error",
                "prerequisites": [{"requires": "attribute", "name": "frequency"}]
            }
        ]"#;
        let set = RuleSet::from_json_str(json).unwrap();
        let rule = set.get("frequency_valid").unwrap();
        assert_eq!(rule.scope, Scope::Global);
        assert_eq!(rule.check.kind(), "membership");
        assert_eq!(rule.prerequisites.len(), 1);
    }

    #[test]
    fn test_deserialization_rejects_self_prerequisite() {
        let json = r#"[
            {
                "id": "a",
                "group": "Global Attributes",
                "scope": {"scope": "global"},
                "check": {"kind": "presence", "attribute": "x"},
                "severity": "error",
                "prerequisites": [{"requires": "rule", "name": "a"}]
            }
        ]"#;
        let err = serde_json::from_str::<RuleSet>(json).unwrap_err();
        assert!(err.to_string().contains("not declared before it"));
        assert!(RuleSet::from_json_str(json).is_err());
    }

    #[test]
    fn test_deserialization_rejects_prerequisite_cycle() {
        let set = RuleSet::new(vec![presence("a", "x"), presence("b", "y").requires_rule("a")]).unwrap();
        let mut rules: Vec<Rule> = set.into();
        rules[0] = presence("a", "x").requires_rule("b");
        let json = serde_json::to_string(&rules).unwrap();
        assert!(serde_json::from_str::<RuleSet>(&json).is_err());
    }

    #[test]
    fn test_serialization_round_trips_through_validation() {
        let set = RuleSet::new(vec![presence("a", "x"), presence("b", "y").requires_rule("a")]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.starts_with('['));
        assert_eq!(serde_json::from_str::<RuleSet>(&json).unwrap(), set);
    }
}
