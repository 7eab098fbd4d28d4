//! Dimension templates for shape checks.

use crate::cv::CvNode;
use crate::metadata::Dimension;

/// One expected dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSpec {
    /// Accepted names; the first is the canonical one.
    pub names: Vec<String>,
    /// Fixed size, or `None` for free-sized dimensions.
    pub size: Option<usize>,
}

impl DimensionSpec {
    fn named(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            size: None,
        }
    }

    fn accepts(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn label(&self) -> String {
        self.names.join("|")
    }
}

/// Expected dimension order and sizes of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeTemplate {
    pub dims: Vec<DimensionSpec>,
}

impl ShapeTemplate {
    /// Build a template from a CV node.
    ///
    /// - a set lists dimension names in netCDF order;
    /// - a map holds `dimensions` (set or whitespace-separated string) and an
    ///   optional `sizes` map of fixed sizes;
    /// - a leaf is a CMOR dimension string, see [`ShapeTemplate::from_cmor`].
    pub fn from_node(node: &CvNode, axes: &[&CvNode]) -> Result<Self, String> {
        match node {
            CvNode::Set(names) => Ok(Self {
                dims: names.iter().map(DimensionSpec::named).collect(),
            }),
            CvNode::Map(entries) => {
                let names: Vec<String> = match entries.get("dimensions") {
                    Some(CvNode::Set(names)) => names.clone(),
                    Some(CvNode::Leaf(text)) => {
                        text.split_whitespace().map(str::to_string).collect()
                    }
                    _ => return Err("template map has no 'dimensions' list".to_string()),
                };
                let sizes = entries.get("sizes");
                let mut dims = Vec::with_capacity(names.len());
                for name in names {
                    let size = match sizes.and_then(|s| s.child(&name)).and_then(CvNode::as_text) {
                        Some(text) => Some(text.trim().parse::<usize>().map_err(|_| {
                            format!("size '{}' of dimension '{}' is not an integer", text, name)
                        })?),
                        None => None,
                    };
                    dims.push(DimensionSpec {
                        names: vec![name],
                        size,
                    });
                }
                Ok(Self { dims })
            }
            CvNode::Leaf(text) => Ok(Self::from_cmor(text, axes)),
        }
    }

    /// Build a template from a CMOR `dimensions` string.
    ///
    /// CMOR lists axes in Fortran order (`longitude latitude time height2m`),
    /// so the list is reversed. Axis names are translated to their `out_name`
    /// through the `axes` maps (`axis_entry` of the coordinate and grid
    /// tables); scalar axes (those with a non-empty `value`) are dropped.
    /// Horizontal axes also accept any grid axis sharing their `axis` letter,
    /// so `rlat`/`rlon` satisfy `latitude`/`longitude`.
    pub fn from_cmor(dimensions: &str, axes: &[&CvNode]) -> Self {
        let mut dims = Vec::new();
        for axis_name in dimensions.split_whitespace().rev() {
            let entry = axes.iter().find_map(|map| map.child(axis_name));
            let Some(entry) = entry else {
                dims.push(DimensionSpec::named(axis_name));
                continue;
            };

            let is_scalar = entry
                .child("value")
                .and_then(CvNode::as_text)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            if is_scalar {
                continue;
            }

            let out_name = entry
                .child("out_name")
                .and_then(CvNode::as_text)
                .unwrap_or(axis_name)
                .to_string();
            let mut names = vec![out_name];

            if let Some(letter) = entry.child("axis").and_then(CvNode::as_text) {
                if letter == "X" || letter == "Y" {
                    for map in axes {
                        for candidate in map.entries().into_iter().flat_map(|e| e.values()) {
                            let same_axis = candidate.child("axis").and_then(CvNode::as_text) == Some(letter);
                            if let Some(name) = candidate.child("out_name").and_then(CvNode::as_text) {
                                if same_axis && !names.iter().any(|n| n == name) {
                                    names.push(name.to_string());
                                }
                            }
                        }
                    }
                }
            }

            dims.push(DimensionSpec { names, size: None });
        }
        Self { dims }
    }

    /// Compare actual dimensions against the template.
    ///
    /// Unlimited dimensions and dimensions without a fixed size are exempt
    /// from the size comparison.
    pub fn mismatch(&self, actual: &[Dimension]) -> Option<String> {
        let order_ok = actual.len() == self.dims.len()
            && actual.iter().zip(&self.dims).all(|(a, spec)| spec.accepts(&a.name));
        if !order_ok {
            let got: Vec<&str> = actual.iter().map(|d| d.name.as_str()).collect();
            return Some(format!(
                "dimensions ({}) do not match expected ({})",
                got.join(", "),
                self.describe()
            ));
        }

        for (dim, spec) in actual.iter().zip(&self.dims) {
            if let Some(expected) = spec.size {
                if !dim.unlimited && dim.size != expected {
                    return Some(format!(
                        "dimension '{}' has size {}, expected {}",
                        dim.name, dim.size, expected
                    ));
                }
            }
        }
        None
    }

    /// Comma-separated rendering of the expected dimensions.
    pub fn describe(&self) -> String {
        self.dims
            .iter()
            .map(DimensionSpec::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> CvNode {
        CvNode::from_json(&value).unwrap()
    }

    fn dims(spec: &[(&str, usize)]) -> Vec<Dimension> {
        spec.iter().map(|(n, s)| Dimension::new(*n, *s)).collect()
    }

    #[test]
    fn test_fixed_sizes_and_free_time() {
        let template = ShapeTemplate::from_node(
            &node(json!({"dimensions": ["time", "lat", "lon"], "sizes": {"lat": 192, "lon": 384}})),
            &[],
        )
        .unwrap();

        assert_eq!(template.mismatch(&dims(&[("time", 1), ("lat", 192), ("lon", 384)])), None);
        assert_eq!(template.mismatch(&dims(&[("time", 600), ("lat", 192), ("lon", 384)])), None);
        assert!(template.mismatch(&dims(&[("time", 1), ("lon", 384), ("lat", 192)])).is_some());
        assert!(template.mismatch(&dims(&[("time", 1), ("lat", 96), ("lon", 384)])).is_some());
    }

    #[test]
    fn test_cmor_string_reversed_and_scalar_dropped() {
        let coordinate = node(json!({
            "longitude": {"out_name": "lon", "axis": "X", "value": ""},
            "latitude": {"out_name": "lat", "axis": "Y", "value": ""},
            "time": {"out_name": "time", "axis": "T", "value": ""},
            "height2m": {"out_name": "height", "axis": "Z", "value": "2."}
        }));
        let grids = node(json!({
            "grid_longitude": {"out_name": "rlon", "axis": "X"},
            "grid_latitude": {"out_name": "rlat", "axis": "Y"}
        }));
        let template = ShapeTemplate::from_node(
            &CvNode::Leaf("longitude latitude time height2m".into()),
            &[&coordinate, &grids],
        )
        .unwrap();

        assert_eq!(template.describe(), "time, lat|rlat, lon|rlon");
        assert_eq!(template.mismatch(&dims(&[("time", 12), ("rlat", 412), ("rlon", 424)])), None);
        assert!(template.mismatch(&dims(&[("time", 12), ("rlon", 424), ("rlat", 412)])).is_some());
    }

    #[test]
    fn test_bad_size_is_error() {
        let err = ShapeTemplate::from_node(
            &node(json!({"dimensions": ["lat"], "sizes": {"lat": "many"}})),
            &[],
        )
        .unwrap_err();
        assert!(err.contains("lat"));
    }
}
