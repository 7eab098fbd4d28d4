//! Process-lifetime cache of loaded CV tables.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::{Cc6Error, Result};

use super::source::CvSource;
use super::table::CvTable;

/// Loads CV tables from a [`CvSource`] and caches them by `(project, version)`.
///
/// Entries are never invalidated, so a run always sees one consistent CV
/// snapshot. Tables are handed out as `Arc<CvTable>` and are safe to share
/// between concurrent checks.
pub struct CvRepository {
    source: Box<dyn CvSource>,
    tables: Vec<String>,
    cache: Mutex<HashMap<(String, String), Arc<CvTable>>>,
}

impl CvRepository {
    /// Create a repository loading the given table names from `source`.
    pub fn new<I, S>(source: impl CvSource + 'static, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: Box::new(source),
            tables: tables.into_iter().map(Into::into).collect(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Table names loaded for every (project, version).
    pub fn table_names(&self) -> &[String] {
        &self.tables
    }

    /// Load (or fetch from cache) the CV for `project` at `version`.
    ///
    /// Every configured table is mandatory; the first missing or malformed
    /// one fails the whole load with [`Cc6Error::CvLoad`].
    pub fn load(&self, project: &str, version: &str) -> Result<Arc<CvTable>> {
        if self.tables.is_empty() {
            return Err(Cc6Error::cv_load(project, version, "no CV tables configured"));
        }

        let key = (project.to_string(), version.to_string());
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(table) = cache.get(&key) {
            debug!(project, version, "CV cache hit");
            return Ok(Arc::clone(table));
        }

        debug!(
            project,
            version,
            source = %self.source.describe(),
            tables = self.tables.len(),
            "loading CV tables"
        );

        let mut documents = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let bytes = self.source.fetch(project, version, table)?;
            documents.push((table.clone(), bytes));
        }

        let table = Arc::new(CvTable::from_documents(project, version, documents)?);
        debug!(project, version, digest = table.digest(), "CV loaded");
        cache.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Number of cached (project, version) entries.
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
