//! Rule evaluation.

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, warn};

use crate::cv::{CvNode, CvTable, VocabularyPath};
use crate::error::{Cc6Error, Result};
use crate::metadata::{AttrValue, MetadataNode, MetadataSnapshot};
use crate::rules::{
    convert_posix_to_rust, AllowedSource, Check, Consistency, Normalization, Operand,
    PathTemplate, PatternSource, Prerequisite, ReferencedBy, Rule, RuleSet, Scope, Segment,
    Subject, VariableSelector,
};

use super::outcome::{Disposition, RuleResult, Severity, Target};
use super::shape::ShapeTemplate;
use super::calendar::Calendar;
use super::time::{
    chunk_years, expected_chunk, first_irregular_step, parse_time_units, spacing_tolerance,
    TimeSampling,
};

/// Longest allowed-value list quoted in a failure message.
const MAX_LISTED_VALUES: usize = 20;

/// Dataset-side inputs of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Normalized dataset metadata.
    pub snapshot: &'a MetadataSnapshot,
    /// The data variable being checked, if one was identified.
    pub data_variable: Option<&'a str>,
    /// Every CV-known data variable found in the dataset.
    pub candidates: &'a [String],
}

impl<'a> EvaluationContext<'a> {
    /// Context with no identified data variable.
    pub fn new(snapshot: &'a MetadataSnapshot) -> Self {
        Self {
            snapshot,
            data_variable: None,
            candidates: &[],
        }
    }

    /// Set the data variable candidates; the first one is checked.
    pub fn with_candidates(mut self, candidates: &'a [String]) -> Self {
        self.candidates = candidates;
        self.data_variable = candidates.first().map(String::as_str);
        self
    }

    fn global(&self) -> &'a MetadataNode {
        &self.snapshot.global
    }
}

/// Outcome of a single check before severity is applied.
enum Verdict {
    Pass(String),
    Fail(String),
    Skip(String),
}

/// Evaluates rules against one dataset and one CV snapshot.
///
/// Pure with respect to its inputs: the same table, snapshot and rules always
/// give the same results in the same order. The only state is a per-run memo
/// of which rules passed, used for rule prerequisites.
pub struct Evaluator<'a> {
    table: &'a CvTable,
    rules: &'a RuleSet,
    context: EvaluationContext<'a>,
    outcomes: HashMap<String, bool>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator.
    pub fn new(table: &'a CvTable, rules: &'a RuleSet, context: EvaluationContext<'a>) -> Self {
        Self {
            table,
            rules,
            context,
            outcomes: HashMap::new(),
        }
    }

    /// Evaluate every rule, in declaration order.
    pub fn evaluate_all(&mut self) -> Vec<RuleResult> {
        let rules = self.rules;
        rules
            .rules()
            .iter()
            .flat_map(|rule| self.evaluate(rule))
            .collect()
    }

    /// Evaluate the rules of one group, in declaration order.
    pub fn evaluate_group(&mut self, group: &str) -> Vec<RuleResult> {
        let rules = self.rules;
        rules
            .in_group(group)
            .flat_map(|rule| self.evaluate(rule))
            .collect()
    }

    /// Evaluate one rule on all of its targets.
    pub fn evaluate(&mut self, rule: &Rule) -> Vec<RuleResult> {
        debug!(rule = %rule.id, kind = rule.check.kind(), "evaluating rule");
        // Marked failed while running so a prerequisite cycle reads as unmet.
        self.outcomes.insert(rule.id.clone(), false);

        let results = match self.unmet_prerequisite(rule) {
            Some(reason) => self
                .targets(rule)
                .into_iter()
                .map(|target| make_result(rule, target, Verdict::Skip(reason.clone())))
                .collect(),
            None => self.run(rule),
        };

        let passed = !results.is_empty() && results.iter().all(RuleResult::passed);
        self.outcomes.insert(rule.id.clone(), passed);
        results
    }

    fn unmet_prerequisite(&mut self, rule: &Rule) -> Option<String> {
        for prerequisite in &rule.prerequisites {
            match prerequisite {
                Prerequisite::Attribute(name) => {
                    if !self.context.global().get(name).is_present() {
                        return Some(format!("Prerequisite attribute '{}' is missing.", name));
                    }
                }
                Prerequisite::Rule(id) => {
                    if !self.rule_passed(id) {
                        return Some(format!("Prerequisite rule '{}' did not pass.", id));
                    }
                }
            }
        }
        None
    }

    /// Whether a rule passed, evaluating it silently if it has not run yet
    /// (e.g. when only one group is being evaluated).
    fn rule_passed(&mut self, id: &str) -> bool {
        if let Some(passed) = self.outcomes.get(id) {
            return *passed;
        }
        let rules = self.rules;
        match rules.get(id) {
            Some(rule) => {
                self.evaluate(rule);
                self.outcomes.get(id).copied().unwrap_or(false)
            }
            None => false,
        }
    }

    /// The instances a rule produces results for.
    fn targets(&self, rule: &Rule) -> Vec<Target> {
        let snapshot = self.context.snapshot;
        match &rule.scope {
            Scope::Global => vec![Target::Global],
            Scope::Variable(VariableSelector::Data) => vec![Target::Variable(
                self.context.data_variable.unwrap_or("<data variable>").to_string(),
            )],
            Scope::Variable(VariableSelector::Named(name)) => vec![Target::Variable(name.clone())],
            Scope::Variable(VariableSelector::All) => snapshot
                .variables
                .keys()
                .map(|name| Target::Variable(name.clone()))
                .collect(),
            Scope::Dimension => {
                let exempt: &[String] = match &rule.check {
                    Check::CoordinateVariable { exempt } => exempt,
                    _ => &[],
                };
                snapshot
                    .dimensions
                    .iter()
                    .filter(|d| !exempt.contains(&d.name))
                    .map(|d| Target::Dimension(d.name.clone()))
                    .collect()
            }
        }
    }

    fn run(&self, rule: &Rule) -> Vec<RuleResult> {
        if let Check::RequiredAttributes { list } = &rule.check {
            return self.run_required_attributes(rule, list);
        }

        self.targets(rule)
            .into_iter()
            .map(|target| {
                let verdict = self.check_target(rule, &target);
                make_result(rule, target, verdict)
            })
            .collect()
    }

    fn check_target(&self, rule: &Rule, target: &Target) -> Verdict {
        let verdict = match target {
            Target::Variable(name) => match self.context.snapshot.variable(name) {
                Some(node) => self.check_node(rule, node, target),
                None if matches!(rule.scope, Scope::Variable(VariableSelector::Data))
                    && self.context.data_variable.is_none() =>
                {
                    Ok(Verdict::Skip("No data variable identified.".to_string()))
                }
                None => Ok(Verdict::Skip(format!("Variable '{}' is not present.", name))),
            },
            _ => self.check_node(rule, self.context.global(), target),
        };

        match verdict {
            Ok(verdict) => verdict,
            Err(Cc6Error::CvPath { path, segment }) => {
                warn!(rule = %rule.id, %path, %segment, "CV path does not resolve, skipping rule");
                Verdict::Skip(format!(
                    "CV misconfiguration: path '{}' does not resolve (missing '{}').",
                    path, segment
                ))
            }
            Err(err @ Cc6Error::UnknownValue { .. }) => Verdict::Fail(format!("{}.", err)),
            Err(Cc6Error::RuleEvaluation { message, .. }) => {
                Verdict::Fail(format!("Rule '{}' could not be evaluated: {}", rule.id, message))
            }
            Err(other) => Verdict::Fail(format!("Rule '{}' could not be evaluated: {}", rule.id, other)),
        }
    }

    fn check_node(&self, rule: &Rule, node: &MetadataNode, target: &Target) -> Result<Verdict> {
        match &rule.check {
            Check::Presence { attribute } => Ok(check_presence(node, attribute)),
            Check::RequiredAttributes { .. } => Ok(Verdict::Skip(
                "Required attribute lists are expanded per attribute.".to_string(),
            )),
            Check::Membership {
                subject,
                allowed,
                normalization,
            } => self.check_membership(rule, node, target, subject, allowed, *normalization),
            Check::Pattern { attribute, pattern } => {
                self.check_pattern(rule, node, attribute, pattern)
            }
            Check::CrossConsistency(consistency) => self.check_consistency(rule, consistency),
            Check::Shape { template, axes } => self.check_shape(node, template, axes),
            Check::DataVariable => Ok(self.check_data_variable()),
            Check::CoordinateVariable { .. } => Ok(self.check_coordinate_variable(target)),
            Check::Compression {
                deflate_level,
                shuffle,
            } => Ok(check_compression(node, *deflate_level, *shuffle)),
            Check::FileFormat {
                data_model,
                disk_format,
            } => Ok(self.check_file_format(data_model, disk_format)),
        }
    }

    fn run_required_attributes(&self, rule: &Rule, list: &PathTemplate) -> Vec<RuleResult> {
        let required = match self.resolve(list) {
            Ok(node) => node.allowed_values(),
            Err(Cc6Error::CvPath { path, segment }) => {
                warn!(rule = %rule.id, %path, %segment, "CV path does not resolve, skipping rule");
                let message = format!(
                    "CV misconfiguration: path '{}' does not resolve (missing '{}').",
                    path, segment
                );
                return vec![make_result(rule, Target::Global, Verdict::Skip(message))];
            }
            Err(err @ Cc6Error::UnknownValue { .. }) => {
                return vec![make_result(rule, Target::Global, Verdict::Fail(format!("{}.", err)))];
            }
            Err(other) => {
                let message = format!("Rule '{}' could not be evaluated: {}", rule.id, other);
                return vec![make_result(rule, Target::Global, Verdict::Skip(message))];
            }
        };

        let node = match &rule.scope {
            Scope::Variable(selector) => self.select_variable(selector),
            _ => Some(self.context.global()),
        };

        required
            .into_iter()
            .map(|attribute| {
                let verdict = match node {
                    Some(node) => check_presence(node, attribute),
                    None => Verdict::Skip("Target variable is not present.".to_string()),
                };
                make_result(rule, Target::Attribute(attribute.to_string()), verdict)
            })
            .collect()
    }

    fn select_variable(&self, selector: &VariableSelector) -> Option<&'a MetadataNode> {
        let snapshot = self.context.snapshot;
        match selector {
            VariableSelector::Data => self.context.data_variable.and_then(|n| snapshot.variable(n)),
            VariableSelector::Named(name) => snapshot.variable(name),
            VariableSelector::All => None,
        }
    }

    fn bind(&self, template: &PathTemplate) -> std::result::Result<VocabularyPath, String> {
        template
            .bind(self.context.global(), self.context.data_variable)
            .map_err(|unbound| format!("CV path '{}' needs {}.", template, unbound.placeholder))
    }

    /// Bind and resolve a template. Unbound placeholders are reported as a
    /// path error on the placeholder.
    ///
    /// A missing literal segment is a CV gap ([`Cc6Error::CvPath`]); a
    /// missing segment bound from the dataset is a dataset value the CV does
    /// not know ([`Cc6Error::UnknownValue`]).
    fn resolve(&self, template: &PathTemplate) -> Result<&'a CvNode> {
        let path = self.bind(template).map_err(|message| Cc6Error::CvPath {
            path: template.to_string(),
            segment: message,
        })?;

        let mut node = self.table.root();
        for (segment, key) in template.segments().iter().zip(path.segments()) {
            node = match node.child(key) {
                Some(child) => child,
                None => {
                    return Err(match segment {
                        Segment::Literal(_) => Cc6Error::CvPath {
                            path: path.to_string(),
                            segment: key.clone(),
                        },
                        Segment::Attribute(name) => Cc6Error::UnknownValue {
                            path: path.to_string(),
                            value: key.clone(),
                            origin: format!("Global attribute '{}' with value", name),
                        },
                        Segment::DataVariable => Cc6Error::UnknownValue {
                            path: path.to_string(),
                            value: key.clone(),
                            origin: "Data variable".to_string(),
                        },
                    });
                }
            };
        }
        Ok(node)
    }

    fn check_membership(
        &self,
        rule: &Rule,
        node: &MetadataNode,
        target: &Target,
        subject: &Subject,
        allowed: &[AllowedSource],
        normalization: Normalization,
    ) -> Result<Verdict> {
        for source in allowed {
            if let Some(unbound) = self.unbound_in_source(source) {
                return Ok(Verdict::Skip(unbound));
            }
        }

        let (label, raw) = match subject {
            Subject::Attribute(attribute) => {
                let value = node.get(attribute);
                if !value.is_present() {
                    return Ok(Verdict::Skip(format!(
                        "Attribute '{}' is missing on {}.",
                        attribute,
                        describe_node(node)
                    )));
                }
                let text = scalar_text(rule, attribute, value)?;
                (format!("Attribute '{}' of {}", attribute, describe_node(node)), text)
            }
            Subject::Name => match target {
                Target::Variable(name) => (format!("Variable '{}'", name), name.clone()),
                Target::Dimension(name) => (format!("Dimension '{}'", name), name.clone()),
                _ => {
                    return Err(Cc6Error::rule_evaluation(
                        &rule.id,
                        "name membership needs a variable or dimension scope",
                    ));
                }
            },
        };

        let mut known: Vec<String> = Vec::new();
        for source in allowed.iter().filter(|s| s.is_cv()) {
            extend_unique(&mut known, self.allowed_values(source, &[])?);
        }
        let mut values: Vec<String> = Vec::new();
        for source in allowed {
            extend_unique(&mut values, self.allowed_values(source, &known)?);
        }

        let candidate = normalize(&raw, normalization);
        let found = values.iter().any(|v| normalize(v, normalization) == candidate);

        if found {
            Ok(Verdict::Pass(format!("{} has valid value '{}'.", label, raw)))
        } else if matches!(subject, Subject::Name) {
            Ok(Verdict::Fail(format!("{} is not part of the CV.", label)))
        } else {
            Ok(Verdict::Fail(format!(
                "{} has invalid value '{}'. Allowed values: {}.",
                label,
                raw,
                list_values(&values)
            )))
        }
    }

    fn unbound_in_source(&self, source: &AllowedSource) -> Option<String> {
        let template = match source {
            AllowedSource::Cv { path } => path,
            AllowedSource::CvField { map, .. } => map,
            _ => return None,
        };
        self.bind(template).err()
    }

    /// Values one source allows. `known` holds the names allowed by the
    /// rule's CV sources, for references restricted to known variables.
    fn allowed_values(&self, source: &AllowedSource, known: &[String]) -> Result<Vec<String>> {
        match source {
            AllowedSource::Cv { path } => Ok(self
                .resolve(path)?
                .allowed_values()
                .into_iter()
                .map(str::to_string)
                .collect()),
            AllowedSource::CvField { map, field } => {
                let node = self.resolve(map)?;
                Ok(node
                    .entries()
                    .into_iter()
                    .flat_map(|entries| entries.values())
                    .filter_map(|entry| entry.child(field).and_then(CvNode::as_text))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect())
            }
            AllowedSource::Referenced { attribute, by } => {
                let snapshot = self.context.snapshot;
                let referrers: Vec<&MetadataNode> = match by {
                    ReferencedBy::Any => snapshot.variables.values().collect(),
                    ReferencedBy::DataVariable => self
                        .context
                        .data_variable
                        .and_then(|name| snapshot.variable(name))
                        .into_iter()
                        .collect(),
                    ReferencedBy::KnownVariable => snapshot
                        .variables
                        .iter()
                        .filter(|(name, _)| known.contains(*name))
                        .map(|(_, node)| node)
                        .collect(),
                };
                Ok(referrers
                    .into_iter()
                    .filter_map(|var| var.get(attribute).as_str())
                    .flat_map(str::split_whitespace)
                    .map(str::to_string)
                    .collect())
            }
            AllowedSource::DataVariable => Ok(self.context.candidates.to_vec()),
        }
    }

    fn check_pattern(
        &self,
        rule: &Rule,
        node: &MetadataNode,
        attribute: &str,
        pattern: &PatternSource,
    ) -> Result<Verdict> {
        let value = node.get(attribute);
        if !value.is_present() {
            return Ok(Verdict::Skip(format!(
                "Attribute '{}' is missing on {}.",
                attribute,
                describe_node(node)
            )));
        }
        let text = scalar_text(rule, attribute, value)?;

        let patterns: Vec<String> = match pattern {
            PatternSource::Literal(regex) => vec![regex.clone()],
            PatternSource::Cv(path) => {
                if let Err(message) = self.bind(path) {
                    return Ok(Verdict::Skip(message));
                }
                let node = self.resolve(path)?;
                let mut converted = Vec::new();
                for posix in node.allowed_values() {
                    let regex = convert_posix_to_rust(posix);
                    if let Err(e) = Regex::new(&regex) {
                        warn!(rule = %rule.id, pattern = posix, "CV pattern does not compile");
                        return Ok(Verdict::Skip(format!(
                            "CV misconfiguration: pattern '{}' at '{}' is invalid: {}",
                            posix, path, e
                        )));
                    }
                    converted.push(regex);
                }
                converted
            }
        };

        for source in &patterns {
            let full = Regex::new(&format!("^(?:{})$", source)).map_err(|e| {
                Cc6Error::rule_evaluation(&rule.id, format!("invalid pattern '{}': {}", source, e))
            })?;
            if full.is_match(&text) {
                return Ok(Verdict::Pass(format!(
                    "Attribute '{}' matches the expected format.",
                    attribute
                )));
            }
        }

        Ok(Verdict::Fail(format!(
            "Attribute '{}' of {} has value '{}', which does not match the expected format '{}'.",
            attribute,
            describe_node(node),
            text,
            patterns.join("' or '")
        )))
    }

    fn check_consistency(&self, rule: &Rule, consistency: &Consistency) -> Result<Verdict> {
        match consistency {
            Consistency::Paired {
                key,
                value,
                entries,
                field,
            } => self.check_paired(rule, key, value, entries, field.as_deref()),
            Consistency::Equals { left, right } => self.check_equals(rule, left, right),
            Consistency::TimeSpacing { frequency, time } => {
                self.check_time_spacing(rule, frequency, time)
            }
            Consistency::TimeChunking {
                frequency,
                time,
                cell_methods,
            } => self.check_time_chunking(rule, frequency, time, cell_methods),
        }
    }

    fn check_paired(
        &self,
        rule: &Rule,
        key: &str,
        value: &str,
        entries: &PathTemplate,
        field: Option<&str>,
    ) -> Result<Verdict> {
        let global = self.context.global();
        for attribute in [key, value] {
            if !global.get(attribute).is_present() {
                return Ok(Verdict::Skip(format!(
                    "Global attribute '{}' is missing.",
                    attribute
                )));
            }
        }
        let key_value = scalar_text(rule, key, global.get(key))?;
        let paired_value = scalar_text(rule, value, global.get(value))?;
        let key_value = key_value.trim();

        let map = self.resolve(entries)?;
        let Some(entry) = map.child(key_value) else {
            return Ok(Verdict::Fail(format!(
                "The combination {}='{}' / {}='{}' is not a valid entry in the CV.",
                key, key_value, value, paired_value
            )));
        };
        let expected = match field {
            Some(field) => entry.child(field).ok_or_else(|| Cc6Error::CvPath {
                path: format!("{}.{}.{}", entries, key_value, field),
                segment: field.to_string(),
            })?,
            None => entry,
        };

        if expected.allows(paired_value.trim()) {
            Ok(Verdict::Pass(format!(
                "Global attributes '{}' and '{}' are consistent.",
                key, value
            )))
        } else {
            Ok(Verdict::Fail(format!(
                "Global attribute '{}' ('{}') is inconsistent with {}='{}'; the CV expects: {}.",
                value,
                paired_value,
                key,
                key_value,
                list_values(&expected.allowed_values())
            )))
        }
    }

    fn check_equals(&self, rule: &Rule, left: &Operand, right: &Operand) -> Result<Verdict> {
        let left_value = match self.operand(rule, left)? {
            Ok(value) => value,
            Err(reason) => return Ok(Verdict::Skip(reason)),
        };
        let right_value = match self.operand(rule, right)? {
            Ok(value) => value,
            Err(reason) => return Ok(Verdict::Skip(reason)),
        };

        let consistent = match (&left_value, &right_value) {
            (OperandValue::Text(a), OperandValue::Text(b)) => a == b,
            (OperandValue::Text(text), OperandValue::Node(node))
            | (OperandValue::Node(node), OperandValue::Text(text)) => node.allows(text),
            (OperandValue::Node(_), OperandValue::Node(_)) => {
                return Err(Cc6Error::rule_evaluation(
                    &rule.id,
                    "cannot compare two CV nodes",
                ));
            }
        };

        if consistent {
            Ok(Verdict::Pass(format!(
                "{} is consistent with {}.",
                describe_operand(left),
                describe_operand(right)
            )))
        } else {
            Ok(Verdict::Fail(format!(
                "{} ({}) is inconsistent with {} ({}).",
                describe_operand(left),
                left_value,
                describe_operand(right),
                right_value
            )))
        }
    }

    /// Resolve an operand. The inner `Err` is a skip reason.
    fn operand(
        &self,
        rule: &Rule,
        operand: &Operand,
    ) -> Result<std::result::Result<OperandValue<'a>, String>> {
        let data_node = self
            .context
            .data_variable
            .and_then(|name| self.context.snapshot.variable(name));

        let value = match operand {
            Operand::Global(attribute) => {
                let value = self.context.global().get(attribute);
                if !value.is_present() {
                    return Ok(Err(format!("Global attribute '{}' is missing.", attribute)));
                }
                OperandValue::Text(scalar_text(rule, attribute, value)?.trim().to_string())
            }
            Operand::DataAttribute(attribute) => {
                let Some(node) = data_node else {
                    return Ok(Err("No data variable identified.".to_string()));
                };
                let value = node.get(attribute);
                if !value.is_present() {
                    return Ok(Err(format!(
                        "Attribute '{}' is missing on {}.",
                        attribute,
                        describe_node(node)
                    )));
                }
                OperandValue::Text(scalar_text(rule, attribute, value)?.trim().to_string())
            }
            Operand::DataVariableName => match self.context.data_variable {
                Some(name) => OperandValue::Text(name.to_string()),
                None => return Ok(Err("No data variable identified.".to_string())),
            },
            Operand::Cv(path) => {
                if let Err(message) = self.bind(path) {
                    return Ok(Err(message));
                }
                let node = self.resolve(path)?;
                match node.as_text() {
                    Some(text) => OperandValue::Text(text.to_string()),
                    None => OperandValue::Node(node),
                }
            }
        };
        Ok(Ok(value))
    }

    fn check_time_spacing(&self, rule: &Rule, frequency: &str, time: &str) -> Result<Verdict> {
        let value = self.context.global().get(frequency);
        if !value.is_present() {
            return Ok(Verdict::Skip(format!(
                "Global attribute '{}' is missing.",
                frequency
            )));
        }
        let frequency_value = scalar_text(rule, frequency, value)?;
        let frequency_value = frequency_value.trim();

        if frequency_value == "fx" {
            return Ok(Verdict::Pass("Time-invariant field has no time axis.".to_string()));
        }
        let Some(tolerance) = spacing_tolerance(frequency_value) else {
            return Ok(Verdict::Fail(format!(
                "Frequency '{}' not supported.",
                frequency_value
            )));
        };

        let Some(time_node) = self.context.snapshot.variable(time) else {
            return Ok(Verdict::Fail(format!(
                "Coordinate variable '{}' not found in file.",
                time
            )));
        };
        let Some(units) = time_node.get("units").as_str() else {
            return Ok(Verdict::Fail(format!(
                "'{}' variable has no 'units' attribute.",
                time
            )));
        };
        let units = parse_time_units(units)
            .map_err(|message| Cc6Error::rule_evaluation(&rule.id, message))?;

        let Some(values) = time_node.values.as_deref() else {
            return Ok(Verdict::Skip(format!(
                "Values of '{}' are not available.",
                time
            )));
        };
        if values.len() < 2 {
            return Ok(Verdict::Pass(format!(
                "'{}' has a single time step; spacing cannot be checked.",
                time
            )));
        }

        match first_irregular_step(values, &units, &tolerance) {
            None => Ok(Verdict::Pass(format!(
                "Spacing of '{}' is consistent with frequency '{}'.",
                time, frequency_value
            ))),
            Some((index, seconds)) => Ok(Verdict::Fail(format!(
                "Time step {} of '{}' spans {:.2} hours, which is inconsistent with frequency '{}'.",
                index,
                time,
                seconds / 3600.0,
                frequency_value
            ))),
        }
    }

    fn check_time_chunking(
        &self,
        rule: &Rule,
        frequency: &str,
        time: &str,
        cell_methods: &Operand,
    ) -> Result<Verdict> {
        let value = self.context.global().get(frequency);
        if !value.is_present() {
            return Ok(Verdict::Skip(format!(
                "Global attribute '{}' is missing.",
                frequency
            )));
        }
        let frequency_value = scalar_text(rule, frequency, value)?;
        let frequency_value = frequency_value.trim();

        if frequency_value == "fx" {
            return Ok(Verdict::Pass("Time-invariant field is not chunked in time.".to_string()));
        }
        let Some(years) = chunk_years(frequency_value) else {
            return Ok(Verdict::Fail(format!(
                "Frequency '{}' not supported.",
                frequency_value
            )));
        };

        let Some(time_node) = self.context.snapshot.variable(time) else {
            return Ok(Verdict::Fail(format!(
                "Coordinate variable '{}' not found in file.",
                time
            )));
        };
        let missing: Vec<String> = ["calendar", "units"]
            .into_iter()
            .filter(|attribute| !time_node.get(attribute).is_present())
            .map(|attribute| format!("'{}' variable has no '{}' attribute.", time, attribute))
            .collect();
        if !missing.is_empty() {
            return Ok(Verdict::Fail(missing.join(" ")));
        }

        let calendar_name = scalar_text(rule, "calendar", time_node.get("calendar"))?;
        let Some(calendar) = Calendar::from_cf(&calendar_name) else {
            return Ok(Verdict::Fail(format!(
                "Calendar '{}' of '{}' is not supported.",
                calendar_name, time
            )));
        };
        let units = scalar_text(rule, "units", time_node.get("units"))?;
        let units = parse_time_units(&units)
            .map_err(|message| Cc6Error::rule_evaluation(&rule.id, message))?;

        let Some(values) = time_node.values.as_deref() else {
            return Ok(Verdict::Skip(format!(
                "Values of '{}' are not available.",
                time
            )));
        };
        let (Some(first), Some(last)) = (values.first(), values.last()) else {
            return Ok(Verdict::Skip(format!("'{}' has no values.", time)));
        };

        let methods = match self.operand(rule, cell_methods)? {
            Ok(OperandValue::Text(text)) => text,
            Ok(OperandValue::Node(_)) => {
                return Err(Cc6Error::rule_evaluation(
                    &rule.id,
                    "cell_methods must resolve to a single value",
                ));
            }
            Err(reason) => return Ok(Verdict::Skip(reason)),
        };
        let Some(sampling) = TimeSampling::from_cell_methods(&methods) else {
            return Ok(Verdict::Fail(format!(
                "Cannot interpret cell_methods '{}'.",
                methods
            )));
        };

        let stamps = units
            .datetime(calendar, *first)
            .zip(units.datetime(calendar, *last));
        let Some((first, last)) = stamps else {
            return Err(Cc6Error::rule_evaluation(
                &rule.id,
                format!("values of '{}' do not fit the '{}' calendar", time, calendar_name),
            ));
        };
        let expected = expected_chunk(calendar, frequency_value, sampling, first.year)
            .ok_or_else(|| {
                Cc6Error::rule_evaluation(
                    &rule.id,
                    format!("no chunk bounds for year {} on the '{}' calendar", first.year, calendar_name),
                )
            })?;

        let requirement = chunk_requirement(years, frequency_value);
        let mut problems = Vec::new();
        if first != expected.start {
            problems.push(format!(
                "The first timestep differs from expectation ('{}'): '{}'. {}",
                expected.start, first, requirement
            ));
        }
        if last != expected.end {
            problems.push(format!(
                "The last timestep differs from expectation ('{}'): '{}'. {}",
                expected.end, last, requirement
            ));
        }

        if problems.is_empty() {
            Ok(Verdict::Pass(format!(
                "'{}' spans {} full simulation year{} from '{}' to '{}'.",
                time,
                years,
                if years == 1 { "" } else { "s" },
                first,
                last
            )))
        } else {
            Ok(Verdict::Fail(problems.join(" ")))
        }
    }

    fn check_shape(
        &self,
        node: &MetadataNode,
        template: &PathTemplate,
        axes: &[PathTemplate],
    ) -> Result<Verdict> {
        if let Err(message) = self.bind(template) {
            return Ok(Verdict::Skip(message));
        }
        let template_node = self.resolve(template)?;
        let axis_maps: Vec<&CvNode> = axes
            .iter()
            .map(|axis| self.resolve(axis))
            .collect::<Result<_>>()?;

        let shape = ShapeTemplate::from_node(template_node, &axis_maps).map_err(|message| {
            Cc6Error::CvPath {
                path: template.to_string(),
                segment: message,
            }
        })?;

        match shape.mismatch(&node.dimensions) {
            None => Ok(Verdict::Pass(format!(
                "{} has the expected dimensions ({}).",
                capitalize(&describe_node(node)),
                shape.describe()
            ))),
            Some(problem) => Ok(Verdict::Fail(format!(
                "{}: {}.",
                capitalize(&describe_node(node)),
                problem
            ))),
        }
    }

    fn check_data_variable(&self) -> Verdict {
        match self.context.candidates {
            [] => Verdict::Fail("No requested variable could be identified in the file.".to_string()),
            [single] => Verdict::Pass(format!("Data variable '{}' identified.", single)),
            many => Verdict::Fail(format!(
                "More than one variable present in file: {}. Only the first one will be checked.",
                many.join(", ")
            )),
        }
    }

    fn check_coordinate_variable(&self, target: &Target) -> Verdict {
        let Target::Dimension(name) = target else {
            return Verdict::Skip("Coordinate variable checks apply to dimensions.".to_string());
        };
        if self.context.snapshot.variable(name).is_some() {
            Verdict::Pass(format!("Dimension '{}' has a coordinate variable.", name))
        } else {
            Verdict::Fail(format!("Dimension '{}' has no coordinate variable.", name))
        }
    }

    fn check_file_format(&self, data_model: &str, disk_format: &str) -> Verdict {
        let format = &self.context.snapshot.format;
        if format.data_model.is_none() && format.disk_format.is_none() {
            return Verdict::Skip("File format is not reported by the host.".to_string());
        }
        let actual_model = format.data_model.as_deref().unwrap_or("unknown");
        let actual_disk = format.disk_format.as_deref().unwrap_or("unknown");
        if actual_model == data_model && actual_disk == disk_format {
            Verdict::Pass(format!("File format is {}/{}.", data_model, disk_format))
        } else {
            Verdict::Fail(format!(
                "File format differs from expectation ({}/{}): '{}/{}'.",
                data_model, disk_format, actual_model, actual_disk
            ))
        }
    }
}

/// A resolved operand value.
enum OperandValue<'a> {
    Text(String),
    Node(&'a CvNode),
}

impl std::fmt::Display for OperandValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperandValue::Text(text) => write!(f, "'{}'", text),
            OperandValue::Node(node) => write!(f, "one of {}", list_values(&node.allowed_values())),
        }
    }
}

fn check_presence(node: &MetadataNode, attribute: &str) -> Verdict {
    if node.get(attribute).is_present() {
        Verdict::Pass(format!("Attribute '{}' is present.", attribute))
    } else if node.name().is_none() {
        Verdict::Fail(format!("Required global attribute '{}' is missing.", attribute))
    } else {
        Verdict::Fail(format!(
            "Required attribute '{}' is missing on {}.",
            attribute,
            describe_node(node)
        ))
    }
}

fn check_compression(node: &MetadataNode, deflate_level: i64, shuffle: bool) -> Verdict {
    if node.encoding.is_empty() {
        return Verdict::Skip(format!(
            "Storage settings of {} are not reported by the host.",
            describe_node(node)
        ));
    }

    let level = node
        .encoding
        .get("complevel")
        .and_then(AttrValue::as_f64)
        .map(|l| l as i64)
        .unwrap_or(0);
    let has_shuffle = node
        .encoding
        .get("shuffle")
        .and_then(AttrValue::as_f64)
        .map(|s| s != 0.0)
        .unwrap_or(false);

    if level == deflate_level && has_shuffle == shuffle {
        return Verdict::Pass("Data is compressed as recommended.".to_string());
    }

    let mut message = format!(
        "It is recommended that data should be compressed with a 'deflate level' of '{}' and {} 'shuffle' option.",
        deflate_level,
        if shuffle { "enabled" } else { "disabled" }
    );
    if level < 1 {
        message.push_str(" The data is uncompressed.");
    } else if level > deflate_level {
        message.push_str(
            " The data is compressed with a higher 'deflate level' than recommended, this can lead to performance issues when accessing the data.",
        );
    }
    if shuffle && !has_shuffle {
        message.push_str(" The 'shuffle' option is disabled.");
    }
    Verdict::Fail(message)
}

fn make_result(rule: &Rule, target: Target, verdict: Verdict) -> RuleResult {
    let (disposition, message) = match verdict {
        Verdict::Pass(message) => (Disposition::Pass, message),
        Verdict::Skip(message) => (Disposition::Skip, message),
        Verdict::Fail(message) => match rule.severity {
            Severity::Error => (Disposition::Fail, message),
            Severity::Warning | Severity::Info => (Disposition::Warn, message),
        },
    };
    RuleResult::new(
        &rule.id,
        &rule.group,
        target,
        rule.severity,
        disposition,
        message,
    )
}

fn scalar_text(rule: &Rule, attribute: &str, value: &AttrValue) -> Result<String> {
    value.as_scalar_text().ok_or_else(|| {
        Cc6Error::rule_evaluation(
            &rule.id,
            format!(
                "attribute '{}' is a {} ('{}'), expected a single value",
                attribute,
                value.kind(),
                value
            ),
        )
    })
}

fn chunk_requirement(years: i64, frequency: &str) -> String {
    if years == 1 {
        format!(
            "'1' full simulation year is expected in the data file for frequency '{}'.",
            frequency
        )
    } else {
        format!(
            "Unless for the last file of a timeseries '{}' full simulation years are expected in the data file for frequency '{}'.",
            years, frequency
        )
    }
}

fn extend_unique(values: &mut Vec<String>, more: Vec<String>) {
    for value in more {
        if !values.contains(&value) {
            values.push(value);
        }
    }
}

fn normalize(value: &str, normalization: Normalization) -> String {
    let value = if normalization.trim { value.trim() } else { value };
    if normalization.fold_case {
        value.to_lowercase()
    } else {
        value.to_string()
    }
}

fn describe_node(node: &MetadataNode) -> String {
    match node.name() {
        Some(name) => format!("variable '{}'", name),
        None => "the global attributes".to_string(),
    }
}

fn describe_operand(operand: &Operand) -> String {
    match operand {
        Operand::Global(name) => format!("Global attribute '{}'", name),
        Operand::DataAttribute(name) => format!("data variable attribute '{}'", name),
        Operand::DataVariableName => "the data variable name".to_string(),
        Operand::Cv(path) => format!("CV entry '{}'", path),
    }
}

fn list_values<S: AsRef<str>>(values: &[S]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .take(MAX_LISTED_VALUES)
        .map(|v| format!("'{}'", v.as_ref()))
        .collect();
    if values.len() > MAX_LISTED_VALUES {
        format!("{} (and {} more)", quoted.join(", "), values.len() - MAX_LISTED_VALUES)
    } else {
        quoted.join(", ")
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Evaluate `rules` against one dataset snapshot.
pub fn evaluate(
    table: &CvTable,
    rules: &RuleSet,
    context: EvaluationContext<'_>,
) -> Vec<RuleResult> {
    Evaluator::new(table, rules, context).evaluate_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::NodeScope;

    fn rule(severity: Severity) -> Rule {
        Rule::new(
            "r",
            "G",
            Scope::Global,
            Check::Presence {
                attribute: "a".to_string(),
            },
        )
        .with_severity(severity)
    }

    #[test]
    fn test_failure_severity_mapping() {
        let error = make_result(&rule(Severity::Error), Target::Global, Verdict::Fail("x".into()));
        assert_eq!(error.disposition(), Disposition::Fail);
        let warning = make_result(&rule(Severity::Warning), Target::Global, Verdict::Fail("x".into()));
        assert_eq!(warning.disposition(), Disposition::Warn);
        let info = make_result(&rule(Severity::Info), Target::Global, Verdict::Fail("x".into()));
        assert_eq!(info.disposition(), Disposition::Warn);
        let skip = make_result(&rule(Severity::Error), Target::Global, Verdict::Skip("x".into()));
        assert_eq!(skip.disposition(), Disposition::Skip);
    }

    #[test]
    fn test_normalize() {
        let default = Normalization::default();
        assert_eq!(normalize(" day ", default), "day");
        let folded = Normalization {
            trim: false,
            fold_case: true,
        };
        assert_eq!(normalize(" DAY", folded), " day");
    }

    #[test]
    fn test_long_value_lists_are_truncated() {
        let values: Vec<String> = (0..25).map(|i| i.to_string()).collect();
        let listed = list_values(&values);
        assert!(listed.starts_with("'0', '1'"));
        assert!(listed.ends_with("(and 5 more)"));
        assert_eq!(list_values(&["a", "b"]), "'a', 'b'");
    }

    #[test]
    fn test_non_scalar_is_evaluation_error() {
        let value = AttrValue::Numbers(vec![1.0, 2.0]);
        let err = scalar_text(&rule(Severity::Error), "a", &value).unwrap_err();
        assert!(matches!(err, Cc6Error::RuleEvaluation { .. }));
    }

    #[test]
    fn test_prerequisite_cycle_terminates() {
        let table = CvTable::from_value("CORDEX-CMIP6", "test", &serde_json::json!({"CV": {}})).unwrap();
        let snapshot = MetadataSnapshot::new(MetadataNode::new(NodeScope::Global));
        let rules = RuleSet::unchecked(vec![
            rule(Severity::Error).requires_rule("r"),
            Rule::new(
                "s",
                "G",
                Scope::Global,
                Check::Presence {
                    attribute: "b".to_string(),
                },
            )
            .requires_rule("t"),
            Rule::new(
                "t",
                "G",
                Scope::Global,
                Check::Presence {
                    attribute: "c".to_string(),
                },
            )
            .requires_rule("s"),
        ]);

        let results = evaluate(&table, &rules, EvaluationContext::new(&snapshot));
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.disposition() == Disposition::Skip));
    }
}
