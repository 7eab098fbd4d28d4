//! Checker configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cv::{CvRepository, TablesDirectory, LATEST_VERSION};

/// Environment variable naming the CMOR tables directory.
pub const TABLES_PATH_ENV: &str = "CORDEXCMIP6TABLESPATH";

/// Default project name; table files are `<project>_<table>.json`.
pub const DEFAULT_PROJECT: &str = "CORDEX-CMIP6";

/// Tables loaded by default.
pub const DEFAULT_TABLES: &[&str] = &[
    "CV",
    "coordinate",
    "grids",
    "formula_terms",
    "1hr",
    "6hr",
    "day",
    "mon",
    "fx",
];

/// Tables whose `variable_entry` keys name checkable data variables.
pub const DEFAULT_MIP_TABLES: &[&str] = &["1hr", "6hr", "day", "mon", "fx"];

/// Configuration for [`crate::Cc6Checker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Directory holding the table files.
    pub tables_path: PathBuf,
    /// Read tables directly from `tables_path` whatever the version.
    pub flat: bool,
    /// CV project.
    pub project: String,
    /// CV version (`latest` reads `tables_path` itself).
    pub version: String,
    /// Table names to load; all are mandatory.
    pub tables: Vec<String>,
    /// Tables searched for data variables.
    pub mip_tables: Vec<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            tables_path: PathBuf::from("./"),
            flat: false,
            project: DEFAULT_PROJECT.to_string(),
            version: LATEST_VERSION.to_string(),
            tables: DEFAULT_TABLES.iter().map(|t| t.to_string()).collect(),
            mip_tables: DEFAULT_MIP_TABLES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl CheckerConfig {
    /// Defaults, with `tables_path` taken from `CORDEXCMIP6TABLESPATH` when set.
    pub fn from_env() -> Self {
        Self::default().with_tables_path_option(None)
    }

    /// Use `path` if given, else `CORDEXCMIP6TABLESPATH`, else `./`.
    pub fn with_tables_path_option(mut self, path: Option<PathBuf>) -> Self {
        self.tables_path = path
            .or_else(|| std::env::var_os(TABLES_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("./"));
        self
    }

    /// Set the tables directory.
    pub fn with_tables_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tables_path = path.into();
        self
    }

    /// Ignore versions and read tables from `tables_path` directly.
    pub fn with_flat_tables(mut self, flat: bool) -> Self {
        self.flat = flat;
        self
    }

    /// Set the project.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Set the CV version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Replace the table list.
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the MIP table list.
    pub fn with_mip_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mip_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// A repository reading this configuration's tables directory.
    pub fn repository(&self) -> CvRepository {
        let source = if self.flat {
            TablesDirectory::flat(&self.tables_path)
        } else {
            TablesDirectory::new(&self.tables_path)
        };
        CvRepository::new(source, self.tables.iter().cloned())
    }
}
