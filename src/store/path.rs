//! Structured field paths into the form store

use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::error::RuleEditorError;

/// One step of a path: an object key or an array index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Path into the form store, e.g. `rule.children.0.value`
///
/// Kept as segments so nested editors compose paths without string
/// concatenation; the dotted form only exists at the host boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: SmallVec<[PathSegment; 8]>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path; all-digit segments are array indices
    pub fn parse(path: &str) -> Result<Self, RuleEditorError> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = SmallVec::new();
        for part in path.split('.') {
            if part.is_empty() {
                return Err(RuleEditorError::InvalidPath(path.to_string()));
            }
            let segment = match part.parse::<usize>() {
                Ok(index) if part.bytes().all(|b| b.is_ascii_digit()) => PathSegment::Index(index),
                _ => PathSegment::Key(part.to_string()),
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    pub fn key(&self, key: &str) -> Self {
        let mut path = self.clone();
        path.segments.push(PathSegment::Key(key.to_string()));
        path
    }

    pub fn index(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.segments.push(PathSegment::Index(index));
        path
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path without its last segment, plus that segment
    pub fn split_last(&self) -> Option<(FieldPath, &PathSegment)> {
        let (last, rest) = self.segments.split_last()?;
        Some((
            FieldPath {
                segments: rest.iter().cloned().collect(),
            },
            last,
        ))
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// True when one path is an ancestor of (or equal to) the other
    pub fn overlaps(&self, other: &FieldPath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for FieldPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl FromStr for FieldPath {
    type Err = RuleEditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted_path() {
        let path = FieldPath::parse("rule.children.0.value").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("rule".to_string()),
                PathSegment::Key("children".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("value".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "rule.children.0.value");
    }

    #[test]
    fn test_compose_matches_parse() {
        let composed = FieldPath::root()
            .key("rule")
            .key("children")
            .index(3)
            .key("where")
            .key("children")
            .index(0);
        assert_eq!(
            composed,
            FieldPath::parse("rule.children.3.where.children.0").unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(FieldPath::parse("rule..children").is_err());
        assert!(FieldPath::parse("rule.").is_err());
        assert!(FieldPath::parse("").unwrap().is_root());
    }

    #[test]
    fn test_signed_numbers_are_keys() {
        let path = FieldPath::parse("a.+1").unwrap();
        assert_eq!(path.segments()[1], PathSegment::Key("+1".to_string()));
    }

    #[test]
    fn test_overlaps() {
        let group = FieldPath::parse("rule.children").unwrap();
        let value = FieldPath::parse("rule.children.1.value").unwrap();
        let other = FieldPath::parse("rule.operator").unwrap();
        assert!(group.overlaps(&value));
        assert!(value.overlaps(&group));
        assert!(!other.overlaps(&value));
    }

    #[test]
    fn test_split_last() {
        let path = FieldPath::parse("rule.children.2").unwrap();
        let (parent, last) = path.split_last().unwrap();
        assert_eq!(parent.to_string(), "rule.children");
        assert_eq!(last, &PathSegment::Index(2));
        assert!(FieldPath::root().split_last().is_none());
    }
}
