//! Host-facing checker: named check groups over one CV and rule set.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CheckerConfig;
use crate::cv::{CvRepository, CvTable};
use crate::error::{Cc6Error, Result};
use crate::metadata::{HostDataset, MetadataAdapter, MetadataSnapshot};
use crate::report::{aggregate, AggregateReport, GroupReport, HostResult};
use crate::rules::{
    RuleSet, CONSISTENCY, COORDINATES, DIMENSIONS, FILE_FORMAT, GLOBAL_ATTRIBUTES,
    PRESENT_VARIABLES, VARIABLE_ATTRIBUTES,
};
use crate::validation::{EvaluationContext, Evaluator};

/// A registered check, as listed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInfo {
    /// Name the host invokes (`check_global_attributes`).
    pub name: String,
    /// Rule group the check runs.
    pub group: String,
    /// Host priority of the group's most severe rule.
    pub level: u8,
}

/// Name under which a group is registered.
pub fn check_name(group: &str) -> String {
    format!("check_{}", group.to_lowercase().replace(' ', "_"))
}

/// The CORDEX-CMIP6 checker.
///
/// Holds no per-dataset state: every call builds its own snapshot, context
/// and evaluator, so one checker can serve concurrent invocations.
pub struct Cc6Checker {
    config: CheckerConfig,
    repository: CvRepository,
    rules: RuleSet,
}

impl Cc6Checker {
    /// Create a checker with the built-in rules and a tables-directory CV.
    pub fn new(config: CheckerConfig) -> Result<Self> {
        let repository = config.repository();
        Ok(Self {
            config,
            repository,
            rules: RuleSet::cordex_cmip6()?,
        })
    }

    /// Replace the rule set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the CV repository.
    pub fn with_repository(mut self, repository: CvRepository) -> Self {
        self.repository = repository;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// The rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The configured CV, loaded on first use.
    pub fn table(&self) -> Result<Arc<CvTable>> {
        self.repository
            .load(&self.config.project, &self.config.version)
    }

    /// Registered checks, one per rule group.
    pub fn checks(&self) -> Vec<CheckInfo> {
        self.rules
            .groups()
            .into_iter()
            .map(|group| CheckInfo {
                name: check_name(group),
                group: group.to_string(),
                level: self
                    .rules
                    .in_group(group)
                    .map(|r| r.severity.host_level())
                    .max()
                    .unwrap_or(1),
            })
            .collect()
    }

    /// Run one registered check by name.
    pub fn run_check(&self, name: &str, dataset: &dyn HostDataset) -> Result<HostResult> {
        let group = self
            .rules
            .groups()
            .into_iter()
            .find(|group| check_name(group) == name)
            .ok_or_else(|| Cc6Error::UnknownCheck(name.to_string()))?;
        Ok(self.check_group(group, dataset)?.to_host_result())
    }

    /// Run the rules of one group.
    pub fn check_group(&self, group: &str, dataset: &dyn HostDataset) -> Result<GroupReport> {
        if self.rules.in_group(group).next().is_none() {
            return Err(Cc6Error::UnknownCheck(group.to_string()));
        }
        let table = self.table()?;
        let snapshot = MetadataAdapter::new(dataset).snapshot();
        let candidates = self.data_variables(&table, &snapshot);
        let context = EvaluationContext::new(&snapshot).with_candidates(&candidates);

        let results = Evaluator::new(&table, &self.rules, context).evaluate_group(group);
        let report = aggregate(results);
        Ok(report
            .groups
            .into_iter()
            .next()
            .unwrap_or_else(|| GroupReport::new(group)))
    }

    /// Run every rule.
    pub fn check_all(&self, dataset: &dyn HostDataset) -> Result<AggregateReport> {
        let table = self.table()?;
        let snapshot = MetadataAdapter::new(dataset).snapshot();
        Ok(self.evaluate_snapshot(&table, &snapshot))
    }

    /// Run every rule against an already extracted snapshot.
    pub fn evaluate_snapshot(
        &self,
        table: &CvTable,
        snapshot: &MetadataSnapshot,
    ) -> AggregateReport {
        let candidates = self.data_variables(table, snapshot);
        let context = EvaluationContext::new(snapshot).with_candidates(&candidates);
        let results = Evaluator::new(table, &self.rules, context).evaluate_all();
        debug!(results = results.len(), "evaluation finished");
        aggregate(results).with_cv(table)
    }

    /// CV-known data variables present in the dataset, sorted by name.
    ///
    /// A variable is known when it is a `variable_entry` key of any MIP table.
    pub fn data_variables(&self, table: &CvTable, snapshot: &MetadataSnapshot) -> Vec<String> {
        let known: BTreeSet<&str> = self
            .config
            .mip_tables
            .iter()
            .filter_map(|mip| table.root().child(mip))
            .filter_map(|mip| mip.child("variable_entry"))
            .filter_map(|entries| entries.entries())
            .flat_map(|entries| entries.keys().map(String::as_str))
            .collect();

        let found: Vec<String> = snapshot
            .variables
            .keys()
            .filter(|name| known.contains(name.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        match found.as_slice() {
            [] => info!("no CV-known data variable found"),
            [single] => info!(variable = %single, "identified data variable"),
            [first, ..] => info!(
                variable = %first,
                candidates = found.len(),
                "several data variables found, checking the first"
            ),
        }
        found
    }

    /// Global attribute presence, membership and format.
    pub fn check_global_attributes(&self, dataset: &dyn HostDataset) -> Result<HostResult> {
        self.run_group(GLOBAL_ATTRIBUTES, dataset)
    }

    /// Cross-attribute consistency, including frequency and time spacing.
    pub fn check_consistency(&self, dataset: &dyn HostDataset) -> Result<HostResult> {
        self.run_group(CONSISTENCY, dataset)
    }

    /// Data variable identification and unknown variables.
    pub fn check_present_variables(&self, dataset: &dyn HostDataset) -> Result<HostResult> {
        self.run_group(PRESENT_VARIABLES, dataset)
    }

    /// Data variable attributes against the MIP table entry.
    pub fn check_variable_attributes(&self, dataset: &dyn HostDataset) -> Result<HostResult> {
        self.run_group(VARIABLE_ATTRIBUTES, dataset)
    }

    /// Data variable dimension order and sizes.
    pub fn check_dimensions(&self, dataset: &dyn HostDataset) -> Result<HostResult> {
        self.run_group(DIMENSIONS, dataset)
    }

    /// Coordinate variables for every dimension.
    pub fn check_coordinates(&self, dataset: &dyn HostDataset) -> Result<HostResult> {
        self.run_group(COORDINATES, dataset)
    }

    /// File format and compression.
    pub fn check_file_format(&self, dataset: &dyn HostDataset) -> Result<HostResult> {
        self.run_group(FILE_FORMAT, dataset)
    }

    fn run_group(&self, group: &str, dataset: &dyn HostDataset) -> Result<HostResult> {
        Ok(self.check_group(group, dataset)?.to_host_result())
    }
}
