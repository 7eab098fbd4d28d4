//! The host's view of a dataset.
//!
//! Opening files is the host's job. The engine only needs the read-only
//! header exposed through [`HostDataset`]. [`DatasetHeader`] is a plain
//! implementation that deserializes the layout produced by
//! `xarray.Dataset.to_dict(data=False, encoding=True)` (coordinate values may
//! be included under `data`), which is what the CLI reads.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Cc6Error, Result};

/// A dimension as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDimension {
    pub name: String,
    pub size: usize,
    pub unlimited: bool,
}

/// Read-only access to a dataset opened by the host.
pub trait HostDataset {
    /// Global attributes, in file order.
    fn global_attributes(&self) -> Vec<(String, Value)>;

    /// Dimensions, in file order.
    fn dimensions(&self) -> Vec<HostDimension>;

    /// Variable names, in file order.
    fn variable_names(&self) -> Vec<String>;

    /// Attributes of one variable.
    fn variable_attributes(&self, name: &str) -> Option<Vec<(String, Value)>>;

    /// Dimension names of one variable.
    fn variable_dimensions(&self, name: &str) -> Option<Vec<String>>;

    /// Data type of one variable.
    fn variable_dtype(&self, _name: &str) -> Option<String> {
        None
    }

    /// Storage settings of one variable (`zlib`, `complevel`, `shuffle`, ...).
    fn variable_encoding(&self, _name: &str) -> Vec<(String, Value)> {
        Vec::new()
    }

    /// Values of a (coordinate) variable, when loaded.
    fn variable_values(&self, _name: &str) -> Option<Vec<f64>> {
        None
    }

    /// netCDF data model, e.g. `NETCDF4_CLASSIC`.
    fn data_model(&self) -> Option<String> {
        None
    }

    /// On-disk format, e.g. `HDF5`.
    fn disk_format(&self) -> Option<String> {
        None
    }
}

/// One variable of a [`DatasetHeader`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableHeader {
    #[serde(default)]
    pub dims: Vec<String>,
    #[serde(default)]
    pub attrs: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub encoding: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
}

/// A serialized dataset header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetHeader {
    #[serde(default)]
    pub attrs: IndexMap<String, Value>,
    #[serde(default)]
    pub dims: IndexMap<String, usize>,
    #[serde(default)]
    pub coords: IndexMap<String, VariableHeader>,
    #[serde(default)]
    pub data_vars: IndexMap<String, VariableHeader>,
    #[serde(default)]
    pub encoding: DatasetEncoding,
}

/// Dataset-level storage facts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetEncoding {
    #[serde(default)]
    pub unlimited_dims: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_format: Option<String>,
}

impl DatasetHeader {
    /// Load a header from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Cc6Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let header = serde_json::from_reader(BufReader::new(file))?;
        Ok(header)
    }

    /// Parse a header from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn variable(&self, name: &str) -> Option<&VariableHeader> {
        self.coords.get(name).or_else(|| self.data_vars.get(name))
    }
}

impl HostDataset for DatasetHeader {
    fn global_attributes(&self) -> Vec<(String, Value)> {
        self.attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn dimensions(&self) -> Vec<HostDimension> {
        self.dims
            .iter()
            .map(|(name, size)| HostDimension {
                name: name.clone(),
                size: *size,
                unlimited: self.encoding.unlimited_dims.contains(name),
            })
            .collect()
    }

    fn variable_names(&self) -> Vec<String> {
        self.coords
            .keys()
            .chain(self.data_vars.keys().filter(|k| !self.coords.contains_key(*k)))
            .cloned()
            .collect()
    }

    fn variable_attributes(&self, name: &str) -> Option<Vec<(String, Value)>> {
        self.variable(name).map(|var| {
            var.attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
    }

    fn variable_dimensions(&self, name: &str) -> Option<Vec<String>> {
        self.variable(name).map(|var| var.dims.clone())
    }

    fn variable_dtype(&self, name: &str) -> Option<String> {
        self.variable(name).and_then(|var| var.dtype.clone())
    }

    fn variable_encoding(&self, name: &str) -> Vec<(String, Value)> {
        self.variable(name)
            .map(|var| {
                var.encoding
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn variable_values(&self, name: &str) -> Option<Vec<f64>> {
        let data = self.variable(name)?.data.as_ref()?;
        data.iter().map(Value::as_f64).collect()
    }

    fn data_model(&self) -> Option<String> {
        self.encoding.data_model.clone()
    }

    fn disk_format(&self) -> Option<String> {
        self.encoding.disk_format.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"{
        "attrs": {"frequency": "mon", "domain_id": "EUR-12"},
        "dims": {"time": 3, "rlat": 2, "rlon": 2},
        "coords": {
            "time": {"dims": ["time"], "attrs": {"units": "days since 1950-01-01"}, "data": [15.5, 45.0, 74.5]}
        },
        "data_vars": {
            "tas": {"dims": ["time", "rlat", "rlon"], "attrs": {"units": "K"}, "dtype": "float32",
                    "encoding": {"zlib": true, "complevel": 1, "shuffle": true}}
        },
        "encoding": {"unlimited_dims": ["time"], "data_model": "NETCDF4_CLASSIC", "disk_format": "HDF5"}
    }"#;

    #[test]
    fn test_parse_header() {
        let header = DatasetHeader::from_json_str(HEADER).unwrap();
        assert_eq!(header.variable_names(), vec!["time", "tas"]);
        assert_eq!(header.variable_values("time"), Some(vec![15.5, 45.0, 74.5]));
        assert_eq!(header.variable_values("tas"), None);
        assert_eq!(header.data_model().as_deref(), Some("NETCDF4_CLASSIC"));
    }

    #[test]
    fn test_unlimited_dimension() {
        let header = DatasetHeader::from_json_str(HEADER).unwrap();
        let dims = header.dimensions();
        assert!(dims[0].unlimited);
        assert!(!dims[1].unlimited);
    }

    #[test]
    fn test_unknown_variable() {
        let header = DatasetHeader::from_json_str(HEADER).unwrap();
        assert!(header.variable_attributes("pr").is_none());
    }
}
