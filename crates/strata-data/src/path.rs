//! Field paths such as `"a.b[2].c"`
//!
//! Paths address nodes inside a data tree and double as backend slot keys.
//! The root path is the empty string.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// One step of a [`FieldPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Location of a node relative to the root of its tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Path of a named field below this one
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        Self(segments)
    }

    /// Path of a list element below this one
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Path with `other` appended
    #[must_use]
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Whether `self` equals `ancestor` or lies below it
    pub fn starts_with(&self, ancestor: &FieldPath) -> bool {
        self.0.starts_with(&ancestor.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(path: &str) -> Result<Self> {
        let mut segments = Vec::new();
        if path.is_empty() {
            return Ok(Self(segments));
        }

        for (i, part) in path.split('.').enumerate() {
            let (name, mut rest) = match part.find('[') {
                Some(open) => (&part[..open], &part[open..]),
                None => (part, ""),
            };
            // Only the first part may start directly with an index, e.g. "[0].spam"
            if name.is_empty() && (i > 0 || rest.is_empty()) {
                return Err(Error::invalid_path(path, "empty field name"));
            }
            if name.contains(']') {
                return Err(Error::invalid_path(path, format!("stray ']' in '{part}'")));
            }
            if !name.is_empty() {
                segments.push(PathSegment::Field(name.to_string()));
            }

            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .ok_or_else(|| Error::invalid_path(path, format!("unclosed bracket in '{part}'")))?;
                let index = rest[1..close].parse::<usize>().map_err(|_| {
                    Error::invalid_path(path, format!("invalid index in '{part}'"))
                })?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(Error::invalid_path(
                        path,
                        format!("unexpected '{rest}' after index"),
                    ));
                }
            }
        }
        Ok(Self(segments))
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path: FieldPath = "a.b[2].c".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("a".into()),
                PathSegment::Field("b".into()),
                PathSegment::Index(2),
                PathSegment::Field("c".into()),
            ]
        );
        assert_eq!(path.to_string(), "a.b[2].c");
    }

    #[test]
    fn test_root_and_leading_index() {
        let root: FieldPath = "".parse().unwrap();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "");

        let path: FieldPath = "[0][1].x".parse().unwrap();
        assert_eq!(path, FieldPath::root().index(0).index(1).child("x"));
        assert_eq!(path.to_string(), "[0][1].x");
    }

    #[test]
    fn test_invalid_paths() {
        for bad in ["a..b", "a[", "a[x]", "a[1]b", ".a", "a.", "a]"] {
            assert!(bad.parse::<FieldPath>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_starts_with_is_segment_aware() {
        let list: FieldPath = "items[1]".parse().unwrap();
        let inside: FieldPath = "items[1].x".parse().unwrap();
        let other: FieldPath = "items[10].x".parse().unwrap();
        assert!(inside.starts_with(&list));
        assert!(!other.starts_with(&list));
        assert_eq!(list.join(&"x".parse().unwrap()), inside);
    }
}
