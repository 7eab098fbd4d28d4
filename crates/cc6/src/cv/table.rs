//! Versioned, immutable CV tables.

use indexmap::IndexMap;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Cc6Error, Result};

use super::node::CvNode;
use super::path::VocabularyPath;

/// An immutable snapshot of a project's controlled vocabulary.
///
/// The root maps table names (`CV`, `mon`, `coordinate`, ...) to the parsed
/// table documents. Identity is `(project, version)`; `digest` is a SHA-256
/// over the source documents so reports can name the exact snapshot used.
#[derive(Debug, Clone, PartialEq)]
pub struct CvTable {
    project: String,
    version: String,
    digest: String,
    root: CvNode,
}

impl CvTable {
    /// Build a table from raw JSON documents, one per table name.
    pub fn from_documents<I, N>(project: &str, version: &str, documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, Vec<u8>)>,
        N: Into<String>,
    {
        let mut hasher = Sha256::new();
        let mut tables = IndexMap::new();

        for (name, bytes) in documents {
            let name = name.into();
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(&bytes);

            let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
                Cc6Error::cv_load(project, version, format!("table '{}' is not valid JSON: {}", name, e))
            })?;
            if !value.is_object() {
                return Err(Cc6Error::cv_load(
                    project,
                    version,
                    format!("table '{}' must be a JSON object", name),
                ));
            }
            let node = CvNode::from_json(&value).map_err(|message| {
                Cc6Error::cv_load(project, version, format!("table '{}': {}", name, message))
            })?;
            tables.insert(name, node);
        }

        Ok(Self {
            project: project.to_string(),
            version: version.to_string(),
            digest: format!("{:x}", hasher.finalize()),
            root: CvNode::Map(tables),
        })
    }

    /// Build a table from a JSON object whose keys are table names.
    pub fn from_value(project: &str, version: &str, value: &Value) -> Result<Self> {
        let tables = value.as_object().ok_or_else(|| {
            Cc6Error::cv_load(project, version, "CV root must be a JSON object")
        })?;
        let documents = tables
            .iter()
            .map(|(name, doc)| serde_json::to_vec(doc).map(|bytes| (name.clone(), bytes)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_documents(project, version, documents)
    }

    /// Project name, e.g. `CORDEX-CMIP6`.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Version label the table was loaded under.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Hex SHA-256 over the source documents.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Names of the loaded tables.
    pub fn table_names(&self) -> Vec<&str> {
        self.root
            .entries()
            .map(|entries| entries.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The root node (a map of table name to table).
    pub fn root(&self) -> &CvNode {
        &self.root
    }

    /// Resolve a path, failing with the first unresolvable segment.
    pub fn resolve(&self, path: &VocabularyPath) -> Result<&CvNode> {
        resolve(self, path)
    }
}

/// Resolve `path` against `table`.
///
/// Matching is exact and case-sensitive. Fails with [`Cc6Error::CvPath`]
/// naming the first segment that is absent.
pub fn resolve<'t>(table: &'t CvTable, path: &VocabularyPath) -> Result<&'t CvNode> {
    let mut node = &table.root;
    for segment in path.segments() {
        node = node.child(segment).ok_or_else(|| Cc6Error::CvPath {
            path: path.to_string(),
            segment: segment.clone(),
        })?;
    }
    Ok(node)
}
