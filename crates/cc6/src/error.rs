//! Error types for the cc6 library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cc6 operations.
#[derive(Debug, Error)]
pub enum Cc6Error {
    /// A CV table could not be loaded (missing, unreadable or malformed).
    ///
    /// Fatal for the run: the affected check groups cannot execute.
    #[error("Failed to load CV '{project}' version '{version}': {message}")]
    CvLoad {
        project: String,
        version: String,
        message: String,
    },

    /// A vocabulary path does not resolve in the loaded CV.
    #[error("CV path '{path}' does not resolve: segment '{segment}' not found")]
    CvPath { path: String, segment: String },

    /// A vocabulary path segment taken from the dataset has no CV entry.
    ///
    /// Unlike [`Cc6Error::CvPath`] this is a dataset defect: the CV is
    /// fine, the value the dataset supplied is not in it.
    #[error("{origin} '{value}' has no entry at CV path '{path}'")]
    UnknownValue {
        path: String,
        value: String,
        origin: String,
    },

    /// A rule could not be evaluated against the given metadata.
    #[error("Rule '{rule}' could not be evaluated: {message}")]
    RuleEvaluation { rule: String, message: String },

    /// A check name that is not registered with the checker.
    #[error("Unknown check: {0}")]
    UnknownCheck(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Cc6Error {
    /// Build a CV load error.
    pub fn cv_load(
        project: impl Into<String>,
        version: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Cc6Error::CvLoad {
            project: project.into(),
            version: version.into(),
            message: message.into(),
        }
    }

    /// Build a rule evaluation error.
    pub fn rule_evaluation(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Cc6Error::RuleEvaluation {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for cc6 operations.
pub type Result<T> = std::result::Result<T, Cc6Error>;
