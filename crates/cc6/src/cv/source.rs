//! Where raw CV table documents come from.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Cc6Error, Result};

/// Version label that reads tables straight from the tables directory.
pub const LATEST_VERSION: &str = "latest";

/// A provider of raw CV table documents.
///
/// Implementations fetch eagerly and fail fast: a missing or unreadable
/// table is a configuration error, so no retries are attempted.
pub trait CvSource: Send + Sync {
    /// Fetch the raw JSON bytes of one table.
    fn fetch(&self, project: &str, version: &str, table: &str) -> Result<Vec<u8>>;

    /// Human-readable description of the source, used in logs.
    fn describe(&self) -> String;
}

/// Tables stored on disk as `<project>_<table>.json`.
///
/// Versions live in sub-directories (`<root>/<version>/...`). The version
/// [`LATEST_VERSION`] reads from `root` itself, as does any version when the
/// directory was opened with [`TablesDirectory::flat`].
#[derive(Debug, Clone)]
pub struct TablesDirectory {
    root: PathBuf,
    flat: bool,
}

impl TablesDirectory {
    /// Open a versioned tables directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            flat: false,
        }
    }

    /// Open a flat checkout (e.g. the `Tables/` folder of the CMOR tables
    /// repository) whose files all belong to a single version.
    pub fn flat(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            flat: true,
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, version: &str) -> PathBuf {
        if self.flat || version == LATEST_VERSION {
            self.root.clone()
        } else {
            self.root.join(version)
        }
    }

    /// Path of one table file.
    pub fn table_path(&self, project: &str, version: &str, table: &str) -> PathBuf {
        self.version_dir(version)
            .join(format!("{}_{}.json", project, table))
    }
}

impl CvSource for TablesDirectory {
    fn fetch(&self, project: &str, version: &str, table: &str) -> Result<Vec<u8>> {
        let dir = self.version_dir(version);
        if !dir.is_dir() {
            return Err(Cc6Error::cv_load(
                project,
                version,
                format!("version directory '{}' does not exist", dir.display()),
            ));
        }

        let path = self.table_path(project, version, table);
        fs::read(&path).map_err(|e| {
            Cc6Error::cv_load(
                project,
                version,
                format!(
                    "could not open '{}': {}. Make sure CORDEXCMIP6TABLESPATH points to the \
                     Tables directory of the CMOR tables repository",
                    path.display(),
                    e
                ),
            )
        })
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Tables held in memory, keyed by (project, version, table).
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: HashMap<(String, String, String), Vec<u8>>,
}

impl InMemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table document.
    pub fn with_table(
        mut self,
        project: impl Into<String>,
        version: impl Into<String>,
        table: impl Into<String>,
        document: &Value,
    ) -> Self {
        self.insert(project, version, table, document.to_string().into_bytes());
        self
    }

    /// Add raw table bytes (which may be malformed).
    pub fn insert(
        &mut self,
        project: impl Into<String>,
        version: impl Into<String>,
        table: impl Into<String>,
        bytes: Vec<u8>,
    ) {
        self.documents
            .insert((project.into(), version.into(), table.into()), bytes);
    }
}

impl CvSource for InMemorySource {
    fn fetch(&self, project: &str, version: &str, table: &str) -> Result<Vec<u8>> {
        self.documents
            .get(&(project.to_string(), version.to_string(), table.to_string()))
            .cloned()
            .ok_or_else(|| {
                Cc6Error::cv_load(project, version, format!("table '{}' is not available", table))
            })
    }

    fn describe(&self) -> String {
        format!("in-memory ({} documents)", self.documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_versioned_layout() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("v1.0")).unwrap();
        fs::write(dir.path().join("v1.0").join("CORDEX-CMIP6_CV.json"), b"{}").unwrap();

        let source = TablesDirectory::new(dir.path());
        assert_eq!(source.fetch("CORDEX-CMIP6", "v1.0", "CV").unwrap(), b"{}".to_vec());
    }

    #[test]
    fn test_missing_version_fails() {
        let dir = TempDir::new().unwrap();
        let source = TablesDirectory::new(dir.path());
        let err = source.fetch("CORDEX-CMIP6", "v9", "CV").unwrap_err();
        assert!(matches!(err, Cc6Error::CvLoad { .. }));
        assert!(err.to_string().contains("v9"));
    }

    #[test]
    fn test_flat_layout_ignores_version() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("CORDEX-CMIP6_mon.json"), b"{}").unwrap();

        let source = TablesDirectory::flat(dir.path());
        assert!(source.fetch("CORDEX-CMIP6", "1.0", "mon").is_ok());
    }

    #[test]
    fn test_in_memory_source() {
        let source = InMemorySource::new().with_table("P", "1", "CV", &json!({"CV": {}}));
        assert!(source.fetch("P", "1", "CV").is_ok());
        assert!(source.fetch("P", "2", "CV").is_err());
    }
}
