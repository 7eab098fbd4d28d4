//! Vocabulary paths used to navigate a CV table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered sequence of segments addressing a node in a [`CvTable`](super::CvTable).
///
/// The first segment names the table (e.g. `CV`, `mon`, `coordinate`), the
/// remaining segments descend through its nested mappings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VocabularyPath {
    segments: Vec<String>,
}

impl VocabularyPath {
    /// Create a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dotted path such as `CV.CV.frequency`.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::default();
        }
        Self::new(dotted.split('.'))
    }

    /// Return a new path with one more segment appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// The path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path addresses the table root.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for VocabularyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = VocabularyPath::parse("CV.CV.frequency");
        assert_eq!(path.len(), 3);
        assert_eq!(path.segments()[2], "frequency");
        assert_eq!(path.to_string(), "CV.CV.frequency");
    }

    #[test]
    fn test_child() {
        let path = VocabularyPath::new(["mon", "variable_entry"]).child("tas");
        assert_eq!(path.to_string(), "mon.variable_entry.tas");
    }

    #[test]
    fn test_empty_path() {
        assert!(VocabularyPath::parse("").is_empty());
    }
}
