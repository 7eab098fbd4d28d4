//! Projection from the host dataset into the engine's value model.

use indexmap::IndexMap;

use super::host::HostDataset;
use super::node::{Dimension, FileFormat, MetadataNode, NodeScope};
use super::value::AttrValue;

/// Projects a [`HostDataset`] into [`MetadataNode`]s.
///
/// Pure projection: no validation happens here. Missing attributes surface as
/// [`AttrValue::Absent`] through [`MetadataNode::get`].
pub struct MetadataAdapter<'a> {
    dataset: &'a dyn HostDataset,
}

impl<'a> MetadataAdapter<'a> {
    /// Wrap a host dataset.
    pub fn new(dataset: &'a dyn HostDataset) -> Self {
        Self { dataset }
    }

    /// Global attributes.
    pub fn extract_global(&self) -> MetadataNode {
        let mut node = MetadataNode::new(NodeScope::Global);
        for (name, value) in self.dataset.global_attributes() {
            node.insert(name, AttrValue::from_json(&value));
        }
        node
    }

    /// One variable, or `None` if the dataset has no such variable.
    pub fn extract_variable(&self, name: &str) -> Option<MetadataNode> {
        let attributes = self.dataset.variable_attributes(name)?;
        let mut node = MetadataNode::new(NodeScope::Variable(name.to_string()));
        for (attr, value) in attributes {
            node.insert(attr, AttrValue::from_json(&value));
        }

        let sizes = self.list_dimensions();
        node.dimensions = self
            .dataset
            .variable_dimensions(name)
            .unwrap_or_default()
            .into_iter()
            .map(|dim| {
                sizes
                    .iter()
                    .find(|d| d.name == dim)
                    .cloned()
                    .unwrap_or(Dimension::new(dim, 0))
            })
            .collect();
        node.dtype = self.dataset.variable_dtype(name);
        for (key, value) in self.dataset.variable_encoding(name) {
            node.encoding.insert(key, AttrValue::from_json(&value));
        }
        node.values = self.dataset.variable_values(name);
        Some(node)
    }

    /// Variable names, in host order.
    pub fn list_variables(&self) -> Vec<String> {
        self.dataset.variable_names()
    }

    /// Dimensions with their sizes, in host order.
    pub fn list_dimensions(&self) -> Vec<Dimension> {
        self.dataset
            .dimensions()
            .into_iter()
            .map(|d| Dimension {
                name: d.name,
                size: d.size,
                unlimited: d.unlimited,
            })
            .collect()
    }

    /// File container facts.
    pub fn file_format(&self) -> FileFormat {
        FileFormat {
            data_model: self.dataset.data_model(),
            disk_format: self.dataset.disk_format(),
        }
    }

    /// Everything a check invocation needs, extracted in one pass.
    pub fn snapshot(&self) -> MetadataSnapshot {
        let variables = self
            .list_variables()
            .into_iter()
            .filter_map(|name| self.extract_variable(&name).map(|node| (name, node)))
            .collect();

        MetadataSnapshot {
            global: self.extract_global(),
            variables,
            dimensions: self.list_dimensions(),
            format: self.file_format(),
        }
    }
}

/// The metadata of one dataset, owned by a single check invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSnapshot {
    /// Global attributes.
    pub global: MetadataNode,
    /// Variables by name, in host order.
    pub variables: IndexMap<String, MetadataNode>,
    /// Dataset dimensions, in host order.
    pub dimensions: Vec<Dimension>,
    /// File container facts.
    pub format: FileFormat,
}

impl MetadataSnapshot {
    /// Create a snapshot from parts (mostly for tests and embedding).
    pub fn new(global: MetadataNode) -> Self {
        Self {
            global,
            variables: IndexMap::new(),
            dimensions: Vec::new(),
            format: FileFormat::default(),
        }
    }

    /// Builder: add a variable node. Its dimensions are merged into the
    /// dataset dimension list.
    pub fn with_variable(mut self, node: MetadataNode) -> Self {
        for dim in &node.dimensions {
            if !self.dimensions.iter().any(|d| d.name == dim.name) {
                self.dimensions.push(dim.clone());
            }
        }
        if let Some(name) = node.name() {
            self.variables.insert(name.to_string(), node);
        }
        self
    }

    /// Builder: set file format facts.
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    /// Look up a variable node.
    pub fn variable(&self, name: &str) -> Option<&MetadataNode> {
        self.variables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DatasetHeader;

    fn header() -> DatasetHeader {
        DatasetHeader::from_json_str(
            r#"{
                "attrs": {"frequency": "mon", "comment": ""},
                "dims": {"time": 12, "lat": 192, "lon": 384},
                "coords": {"time": {"dims": ["time"], "attrs": {"calendar": "standard"}}},
                "data_vars": {"tas": {"dims": ["time", "lat", "lon"], "attrs": {"units": "K"}}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_extract_global_distinguishes_empty_from_absent() {
        let header = header();
        let adapter = MetadataAdapter::new(&header);
        let global = adapter.extract_global();
        assert_eq!(global.get("comment"), &AttrValue::Text(String::new()));
        assert_eq!(global.get("history"), &AttrValue::Absent);
    }

    #[test]
    fn test_extract_variable_resolves_dimension_sizes() {
        let header = header();
        let adapter = MetadataAdapter::new(&header);
        let tas = adapter.extract_variable("tas").unwrap();
        assert_eq!(tas.dimension_names(), vec!["time", "lat", "lon"]);
        assert_eq!(tas.dimensions[1].size, 192);
        assert!(adapter.extract_variable("pr").is_none());
    }

    #[test]
    fn test_snapshot_keeps_order() {
        let header = header();
        let snapshot = MetadataAdapter::new(&header).snapshot();
        let names: Vec<_> = snapshot.variables.keys().cloned().collect();
        assert_eq!(names, vec!["time", "tas"]);
        assert_eq!(snapshot.dimensions.len(), 3);
    }
}
