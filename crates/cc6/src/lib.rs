//! cc6: controlled-vocabulary compliance checks for CORDEX-CMIP6 datasets.
//!
//! The engine takes a dataset's metadata, resolves it against the project's
//! versioned controlled vocabulary (the CMOR tables), evaluates a declarative
//! rule set and aggregates the results into the score structure of a
//! compliance-checking host.
//!
//! # Core Principles
//!
//! - **Exact**: CV lookups and value comparisons are case-sensitive and
//!   exact; nothing is silently corrected
//! - **Deterministic**: identical inputs always give identical reports
//! - **Skip, don't cascade**: missing prerequisites and CV gaps yield `skip`,
//!   never a dataset failure
//!
//! # Example
//!
//! ```no_run
//! use cc6::{Cc6Checker, CheckerConfig, DatasetHeader};
//!
//! let checker = Cc6Checker::new(CheckerConfig::from_env()).unwrap();
//! let dataset = DatasetHeader::load("tas_header.json").unwrap();
//! let report = checker.check_all(&dataset).unwrap();
//!
//! for group in &report.groups {
//!     println!("{}: {}/{}", group.name, group.passed, group.total);
//! }
//! ```

pub mod config;
pub mod cv;
pub mod error;
pub mod metadata;
pub mod report;
pub mod rules;
pub mod validation;

mod checker;

pub use checker::{check_name, Cc6Checker, CheckInfo};
pub use config::CheckerConfig;
pub use cv::{CvNode, CvRepository, CvSource, CvTable, InMemorySource, TablesDirectory, VocabularyPath};
pub use error::{Cc6Error, Result};
pub use metadata::{AttrValue, DatasetHeader, HostDataset, MetadataAdapter, MetadataNode, MetadataSnapshot};
pub use report::{aggregate, AggregateReport, GroupReport, HostResult};
pub use rules::{Rule, RuleSet};
pub use validation::{Disposition, EvaluationContext, Evaluator, RuleResult, Severity, Target};
