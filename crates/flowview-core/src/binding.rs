//! Paths into the data model.

use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single step of a [`Binding`] or of a path inside a resolved value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object property
    Key(String),
    /// Array position
    Index(usize),
}

impl PathSegment {
    /// The segment rendered as an object key
    pub fn as_key(&self) -> String {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

/// Immutable path into the data model.
///
/// Equality is structural. A binding `contains` another when the other is the
/// same path or a descendant of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Binding {
    segments: Vec<PathSegment>,
}

impl Binding {
    /// Create a binding from already-split segments
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Parse a dotted binding string such as `foo.bar.0` or `foo[0]['bar']`
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CoreError::BindingParseError(
                "Binding cannot be empty".to_string(),
            ));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            let (head, brackets) = match part.find('[') {
                Some(start) => (&part[..start], &part[start..]),
                None => (part, ""),
            };

            if head.is_empty() && brackets.is_empty() {
                return Err(CoreError::BindingParseError(format!(
                    "Empty segment in binding: {}",
                    raw
                )));
            }

            if !head.is_empty() {
                segments.push(Self::segment_from_str(head));
            }

            let mut rest = brackets;
            while !rest.is_empty() {
                let end = rest.find(']').ok_or_else(|| {
                    CoreError::BindingParseError(format!("Unclosed bracket in binding: {}", raw))
                })?;
                let inner = rest[1..end].trim();
                let inner = inner.trim_matches(|c| c == '\'' || c == '"');
                if inner.is_empty() {
                    return Err(CoreError::BindingParseError(format!(
                        "Empty bracket segment in binding: {}",
                        raw
                    )));
                }
                segments.push(Self::segment_from_str(inner));
                rest = &rest[end + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(CoreError::BindingParseError(format!(
                        "Unexpected characters after bracket in binding: {}",
                        raw
                    )));
                }
            }
        }

        Ok(Self { segments })
    }

    fn segment_from_str(raw: &str) -> PathSegment {
        match raw.parse::<usize>() {
            Ok(index) if raw.chars().all(|c| c.is_ascii_digit()) => PathSegment::Index(index),
            _ => PathSegment::Key(raw.to_string()),
        }
    }

    /// The binding's segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Last segment, if any
    pub fn key(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The binding one level up, `None` for a single-segment binding
    pub fn parent(&self) -> Option<Binding> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Binding::new(self.segments[..self.segments.len() - 1].to_vec()))
    }

    /// A binding below this one
    pub fn descendant<I, S>(&self, segments: I) -> Binding
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        let mut all = self.segments.clone();
        all.extend(segments.into_iter().map(Into::into));
        Binding::new(all)
    }

    /// True if `other` is this binding or a descendant of it
    pub fn contains(&self, other: &Binding) -> bool {
        other.segments.len() >= self.segments.len()
            && self.segments.iter().zip(other.segments.iter()).all(|(a, b)| a == b)
    }

    /// True if either binding contains the other
    pub fn overlaps(&self, other: &Binding) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Segments of this binding below `ancestor`, if `ancestor` contains it
    pub fn relative(&self, ancestor: &Binding) -> Option<Vec<PathSegment>> {
        if !ancestor.contains(self) {
            return None;
        }
        Some(self.segments[ancestor.segments.len()..].to_vec())
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl FromStr for Binding {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Binding::parse(s)
    }
}

impl Serialize for Binding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Binding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Binding::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(raw: &str) -> Binding {
        Binding::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_dotted_path() {
        let binding = b("foo.bar.0.baz");
        assert_eq!(
            binding.segments(),
            &[
                PathSegment::Key("foo".to_string()),
                PathSegment::Key("bar".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("baz".to_string()),
            ]
        );
        assert_eq!(binding.to_string(), "foo.bar.0.baz");
    }

    #[test]
    fn test_parse_bracket_forms() {
        assert_eq!(b("foo[0]['bar']"), b("foo.0.bar"));
        assert_eq!(b("foo[\"bar\"].baz"), b("foo.bar.baz"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "   ", "foo..bar", "foo[0", "foo[]", "foo[0]bar"] {
            match Binding::parse(raw) {
                Err(CoreError::BindingParseError(_)) => {}
                other => panic!("Expected parse error for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_contains_and_overlap() {
        let parent = b("foo.bar");
        let child = b("foo.bar.baz");
        let sibling = b("foo.other");

        assert!(parent.contains(&parent));
        assert!(parent.contains(&child));
        assert!(!child.contains(&parent));
        assert!(!parent.contains(&sibling));

        assert!(child.overlaps(&parent));
        assert!(parent.overlaps(&child));
        assert!(!sibling.overlaps(&child));
    }

    #[test]
    fn test_parent_descendant_relative() {
        let binding = b("a.b.c");
        assert_eq!(binding.parent(), Some(b("a.b")));
        assert_eq!(b("a").parent(), None);
        assert_eq!(b("a").descendant(["b", "c"]), binding);
        assert_eq!(
            binding.relative(&b("a")),
            Some(vec![PathSegment::from("b"), PathSegment::from("c")])
        );
        assert_eq!(binding.relative(&b("x")), None);
        assert_eq!(binding.key(), Some(&PathSegment::Key("c".to_string())));
    }

    #[test]
    fn test_serde_as_string() {
        let binding = b("foo.1");
        let json = serde_json::to_value(&binding).unwrap();
        assert_eq!(json, serde_json::json!("foo.1"));
        let back: Binding = serde_json::from_value(json).unwrap();
        assert_eq!(back, binding);
    }
}
