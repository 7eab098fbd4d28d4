//! Normalized metadata nodes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::AttrValue;

static ABSENT: AttrValue = AttrValue::Absent;

/// A dataset dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Dimension name.
    pub name: String,
    /// Current length.
    pub size: usize,
    /// Whether the dimension is unlimited (record dimension).
    #[serde(default)]
    pub unlimited: bool,
}

impl Dimension {
    /// Create a fixed-size dimension.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            unlimited: false,
        }
    }
}

/// Which part of the dataset a node describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "name")]
pub enum NodeScope {
    /// Global (file-level) attributes.
    Global,
    /// A named variable.
    Variable(String),
}

/// Read-only view of one attribute set plus its structural facts.
///
/// Built by the [`MetadataAdapter`](super::MetadataAdapter) for a single
/// check invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataNode {
    /// What this node describes.
    pub scope: NodeScope,
    attributes: IndexMap<String, AttrValue>,
    /// Dimensions of the variable, in declaration order (empty for globals).
    pub dimensions: Vec<Dimension>,
    /// Variable data type (e.g. `float32`).
    pub dtype: Option<String>,
    /// Storage settings reported by the host (compression, chunking).
    pub encoding: IndexMap<String, AttrValue>,
    /// Coordinate values, when the host exposes them.
    pub values: Option<Vec<f64>>,
}

impl MetadataNode {
    /// Create an empty node.
    pub fn new(scope: NodeScope) -> Self {
        Self {
            scope,
            attributes: IndexMap::new(),
            dimensions: Vec::new(),
            dtype: None,
            encoding: IndexMap::new(),
            values: None,
        }
    }

    /// Builder: add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder: add a text attribute.
    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_attribute(name, AttrValue::Text(value.into()))
    }

    /// Builder: set the dimensions.
    pub fn with_dimensions(mut self, dimensions: Vec<Dimension>) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Builder: set coordinate values.
    pub fn with_values(mut self, values: Vec<f64>) -> Self {
        self.values = Some(values);
        self
    }

    /// Insert or replace an attribute. Absent values are not stored.
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) {
        if value.is_present() {
            self.attributes.insert(name.into(), value);
        }
    }

    /// Attribute value, or [`AttrValue::Absent`].
    pub fn get(&self, name: &str) -> &AttrValue {
        self.attributes.get(name).unwrap_or(&ABSENT)
    }

    /// Whether an attribute is present.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attribute names, in host order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Name of the variable (None for the global node).
    pub fn name(&self) -> Option<&str> {
        match &self.scope {
            NodeScope::Global => None,
            NodeScope::Variable(name) => Some(name),
        }
    }

    /// Dimension names, in order.
    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }
}

/// File container facts reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFormat {
    /// netCDF data model, e.g. `NETCDF4_CLASSIC`.
    pub data_model: Option<String>,
    /// On-disk format, e.g. `HDF5`.
    pub disk_format: Option<String>,
}
