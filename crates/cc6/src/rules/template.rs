//! CV path templates with dataset-bound placeholders.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cv::VocabularyPath;
use crate::metadata::MetadataNode;

/// One segment of a [`PathTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A fixed key.
    Literal(String),
    /// The value of a global attribute (`{attr:frequency}`).
    Attribute(String),
    /// The name of the checked data variable (`{variable}`).
    DataVariable,
}

/// A vocabulary path whose segments may be bound from the dataset.
///
/// Written as dotted text: `"{attr:frequency}.variable_entry.{variable}.units"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

/// A placeholder that could not be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unbound {
    pub placeholder: String,
}

impl PathTemplate {
    /// Parse dotted template text.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        for raw in text.split('.') {
            if raw.is_empty() {
                return Err(format!("empty segment in path template '{}'", text));
            }
            let segment = if raw == "{variable}" {
                Segment::DataVariable
            } else if let Some(attr) = raw.strip_prefix("{attr:").and_then(|s| s.strip_suffix('}')) {
                if attr.is_empty() {
                    return Err(format!("empty attribute placeholder in '{}'", text));
                }
                Segment::Attribute(attr.to_string())
            } else if raw.starts_with('{') || raw.ends_with('}') {
                return Err(format!("unknown placeholder '{}' in '{}'", raw, text));
            } else {
                Segment::Literal(raw.to_string())
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    /// A template with literal segments only.
    pub fn literal<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(|s| Segment::Literal(s.into()))
                .collect(),
        }
    }

    /// The template segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Global attributes this template reads.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Attribute(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Bind placeholders against the global attributes and data variable.
    pub fn bind(
        &self,
        global: &MetadataNode,
        data_variable: Option<&str>,
    ) -> Result<VocabularyPath, Unbound> {
        let mut bound = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => bound.push(text.clone()),
                Segment::Attribute(name) => {
                    let value = global
                        .get(name)
                        .as_scalar_text()
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .ok_or_else(|| Unbound {
                            placeholder: format!("attribute '{}'", name),
                        })?;
                    bound.push(value);
                }
                Segment::DataVariable => {
                    let name = data_variable.ok_or_else(|| Unbound {
                        placeholder: "data variable".to_string(),
                    })?;
                    bound.push(name.to_string());
                }
            }
        }
        Ok(VocabularyPath::new(bound))
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.clone(),
                Segment::Attribute(name) => format!("{{attr:{}}}", name),
                Segment::DataVariable => "{variable}".to_string(),
            })
            .collect();
        write!(f, "{}", parts.join("."))
    }
}

impl TryFrom<String> for PathTemplate {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PathTemplate> for String {
    fn from(value: PathTemplate) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::NodeScope;

    #[test]
    fn test_parse_placeholders() {
        let template = PathTemplate::parse("{attr:frequency}.variable_entry.{variable}.units").unwrap();
        assert_eq!(template.segments()[0], Segment::Attribute("frequency".into()));
        assert_eq!(template.segments()[2], Segment::DataVariable);
        assert_eq!(template.to_string(), "{attr:frequency}.variable_entry.{variable}.units");
    }

    #[test]
    fn test_bind() {
        let global = MetadataNode::new(NodeScope::Global).with_text("frequency", "mon");
        let template = PathTemplate::parse("{attr:frequency}.variable_entry.{variable}").unwrap();
        let path = template.bind(&global, Some("tas")).unwrap();
        assert_eq!(path.to_string(), "mon.variable_entry.tas");
    }

    #[test]
    fn test_bind_missing_attribute() {
        let global = MetadataNode::new(NodeScope::Global);
        let template = PathTemplate::parse("{attr:frequency}.variable_entry").unwrap();
        let unbound = template.bind(&global, None).unwrap_err();
        assert!(unbound.placeholder.contains("frequency"));
    }

    #[test]
    fn test_reject_unknown_placeholder() {
        assert!(PathTemplate::parse("CV.{table}").is_err());
        assert!(PathTemplate::parse("CV..frequency").is_err());
    }
}
