//! Attribute values of the normalized metadata model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The value of one netCDF attribute.
///
/// `Absent` is an explicit marker for a missing attribute, so presence
/// checks can tell "missing" apart from "present but empty".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    /// The attribute does not exist on the node.
    #[default]
    Absent,
    /// A character attribute.
    Text(String),
    /// A single numeric value.
    Number(f64),
    /// A numeric array attribute with more than one element.
    Numbers(Vec<f64>),
    /// A list of strings (NC_STRING arrays).
    Texts(Vec<String>),
}

impl AttrValue {
    /// Project a host-side JSON value into an attribute value.
    ///
    /// Single-element arrays collapse to scalars, matching how netCDF
    /// libraries expose length-one attributes.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => AttrValue::Absent,
            Value::String(s) => AttrValue::Text(s.clone()),
            Value::Bool(b) => AttrValue::Number(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => n.as_f64().map(AttrValue::Number).unwrap_or(AttrValue::Absent),
            Value::Array(items) => {
                if items.len() == 1 {
                    return Self::from_json(&items[0]);
                }
                if items.iter().all(Value::is_number) {
                    AttrValue::Numbers(items.iter().filter_map(Value::as_f64).collect())
                } else {
                    AttrValue::Texts(
                        items
                            .iter()
                            .map(|item| match item {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                            .collect(),
                    )
                }
            }
            Value::Object(_) => AttrValue::Text(value.to_string()),
        }
    }

    /// Whether the attribute exists.
    pub fn is_present(&self) -> bool {
        !matches!(self, AttrValue::Absent)
    }

    /// Scalar rendering used by value checks.
    ///
    /// Returns `None` for absent and multi-valued attributes. Whole numbers
    /// render without a fractional part (`1.0` becomes `"1"`).
    pub fn as_scalar_text(&self) -> Option<String> {
        match self {
            AttrValue::Text(s) => Some(s.clone()),
            AttrValue::Number(n) => Some(format_number(*n)),
            _ => None,
        }
    }

    /// Borrow the string of a character attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of a scalar attribute.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Absent => "absent",
            AttrValue::Text(_) => "text",
            AttrValue::Number(_) => "number",
            AttrValue::Numbers(_) => "numeric array",
            AttrValue::Texts(_) => "string array",
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Absent => write!(f, "<absent>"),
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Number(n) => write!(f, "{}", format_number(*n)),
            AttrValue::Numbers(ns) => {
                let parts: Vec<String> = ns.iter().map(|n| format_number(*n)).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            AttrValue::Texts(ts) => write!(f, "[{}]", ts.join(", ")),
        }
    }
}

/// Canonical text of a number, shared by attribute values and CV leaves so
/// both sides of a comparison render `1.0` as `1`.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
