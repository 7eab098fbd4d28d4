//! Result aggregation into the host's scoring model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cv::CvTable;
use crate::validation::{Disposition, RuleResult, Severity};

/// Results of one named check group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReport {
    /// Group name.
    pub name: String,
    /// Results with disposition `pass`.
    pub passed: usize,
    /// Results with disposition `pass`, `fail` or `warn`.
    pub total: usize,
    /// Results with disposition `skip`.
    pub skipped: usize,
    /// Every result of the group, in evaluation order.
    pub results: Vec<RuleResult>,
}

impl GroupReport {
    /// An empty group.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: 0,
            total: 0,
            skipped: 0,
            results: Vec::new(),
        }
    }

    fn push(&mut self, result: RuleResult) {
        match result.disposition() {
            Disposition::Pass => {
                self.passed += 1;
                self.total += 1;
            }
            Disposition::Fail | Disposition::Warn => self.total += 1,
            Disposition::Skip => self.skipped += 1,
        }
        self.results.push(result);
    }

    /// Highest severity declared by the group's rules.
    pub fn severity(&self) -> Severity {
        self.results
            .iter()
            .map(RuleResult::severity)
            .max()
            .unwrap_or(Severity::Info)
    }

    /// (severity, message) of every failed or warned result.
    pub fn messages(&self) -> Vec<(Severity, &str)> {
        self.results
            .iter()
            .filter(|r| matches!(r.disposition(), Disposition::Fail | Disposition::Warn))
            .map(|r| (r.severity(), r.message()))
            .collect()
    }

    /// Whether no scored result failed or warned.
    pub fn is_clean(&self) -> bool {
        self.passed == self.total
    }

    /// Convert to the host's result record.
    pub fn to_host_result(&self) -> HostResult {
        HostResult {
            level: self.severity().host_level(),
            value: (self.passed, self.total),
            name: self.name.clone(),
            msgs: self
                .messages()
                .into_iter()
                .map(|(_, message)| message.to_string())
                .collect(),
        }
    }
}

/// The host framework's result record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResult {
    /// Priority: 3 required, 2 recommended, 1 suggested.
    pub level: u8,
    /// (score, out_of).
    pub value: (usize, usize),
    /// Check name.
    pub name: String,
    /// Messages describing what failed.
    pub msgs: Vec<String>,
}

/// Identity of the CV snapshot a report was produced against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvStamp {
    pub project: String,
    pub version: String,
    pub digest: String,
}

impl From<&CvTable> for CvStamp {
    fn from(table: &CvTable) -> Self {
        Self {
            project: table.project().to_string(),
            version: table.version().to_string(),
            digest: table.digest().to_string(),
        }
    }
}

/// Results grouped by check group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Groups in order of first appearance.
    pub groups: Vec<GroupReport>,
    /// The CV snapshot used, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<CvStamp>,
}

impl AggregateReport {
    /// Record the CV snapshot the results were produced against.
    pub fn with_cv(mut self, table: &CvTable) -> Self {
        self.cv = Some(CvStamp::from(table));
        self
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Passed results over all groups.
    pub fn passed(&self) -> usize {
        self.groups.iter().map(|g| g.passed).sum()
    }

    /// Scored results over all groups.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.total).sum()
    }

    /// Skipped results over all groups.
    pub fn skipped(&self) -> usize {
        self.groups.iter().map(|g| g.skipped).sum()
    }

    /// Every (severity, message) pair, group by group.
    pub fn messages(&self) -> Vec<(Severity, &str)> {
        self.groups.iter().flat_map(GroupReport::messages).collect()
    }

    /// Whether any result failed with error severity.
    pub fn has_errors(&self) -> bool {
        self.groups
            .iter()
            .flat_map(|g| &g.results)
            .any(|r| r.disposition() == Disposition::Fail)
    }

    /// One host record per group.
    pub fn to_host_results(&self) -> Vec<HostResult> {
        self.groups.iter().map(GroupReport::to_host_result).collect()
    }
}

/// Group results by their rule's group name.
pub fn aggregate<I>(results: I) -> AggregateReport
where
    I: IntoIterator<Item = RuleResult>,
{
    let mut groups: IndexMap<String, GroupReport> = IndexMap::new();
    for result in results {
        groups
            .entry(result.group().to_string())
            .or_insert_with_key(|name| GroupReport::new(name))
            .push(result);
    }
    AggregateReport {
        groups: groups.into_values().collect(),
        cv: None,
    }
}
