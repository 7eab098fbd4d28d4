//! In-memory representation of CV table contents.

use indexmap::IndexMap;
use serde_json::Value;

use crate::metadata::format_number;

/// A node of a CV table.
///
/// JSON objects become ordered maps, arrays of scalars become sets of
/// allowed values and scalars become leaves. Nothing else is accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum CvNode {
    /// A single string or number.
    Leaf(String),
    /// A list of allowed values, in source order.
    Set(Vec<String>),
    /// A nested mapping, in source order.
    Map(IndexMap<String, CvNode>),
}

impl CvNode {
    /// Convert a parsed JSON document into a CV node.
    ///
    /// Returns a description of the offending location when the document
    /// contains arrays of objects or nested arrays.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        Self::convert(value, "")
    }

    fn convert(value: &Value, location: &str) -> Result<Self, String> {
        match value {
            Value::Object(map) => {
                let mut entries = IndexMap::with_capacity(map.len());
                for (key, child) in map {
                    let child_location = if location.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", location, key)
                    };
                    entries.insert(key.clone(), Self::convert(child, &child_location)?);
                }
                Ok(CvNode::Map(entries))
            }
            Value::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match scalar_text(item) {
                        Some(text) => values.push(text),
                        None => {
                            return Err(format!(
                                "'{}' holds a non-scalar list entry",
                                if location.is_empty() { "<root>" } else { location }
                            ));
                        }
                    }
                }
                Ok(CvNode::Set(values))
            }
            other => Ok(CvNode::Leaf(scalar_text(other).unwrap_or_default())),
        }
    }

    /// Look up a direct child of a map node.
    pub fn child(&self, key: &str) -> Option<&CvNode> {
        match self {
            CvNode::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// The text of a leaf node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CvNode::Leaf(text) => Some(text),
            _ => None,
        }
    }

    /// The entries of a map node.
    pub fn entries(&self) -> Option<&IndexMap<String, CvNode>> {
        match self {
            CvNode::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Values this node allows.
    ///
    /// A set yields its members, a map its keys (CMOR CVs map each allowed id
    /// to a description) and a leaf yields itself.
    pub fn allowed_values(&self) -> Vec<&str> {
        match self {
            CvNode::Leaf(text) => vec![text.as_str()],
            CvNode::Set(values) => values.iter().map(String::as_str).collect(),
            CvNode::Map(entries) => entries.keys().map(String::as_str).collect(),
        }
    }

    /// Whether `value` is an exact member of [`allowed_values`](Self::allowed_values).
    pub fn allows(&self, value: &str) -> bool {
        match self {
            CvNode::Leaf(text) => text == value,
            CvNode::Set(values) => values.iter().any(|v| v == value),
            CvNode::Map(entries) => entries.contains_key(value),
        }
    }

    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CvNode::Leaf(_) => "leaf",
            CvNode::Set(_) => "set",
            CvNode::Map(_) => "map",
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
