//! Logical document paths.
//!
//! A [`Path`] is an ordered sequence of non-empty string segments addressing
//! a location in the document tree. `/` is the root. Partition patterns use
//! the same type with [`WILDCARD`] (`*`) segments standing for "any single
//! segment".
//!
//! Paths serialize as their display form (`"/a/b"`), so persisted metadata
//! stays human-readable.

use crate::{Result, StoreError};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Segment token matching any single segment in a partition pattern.
pub const WILDCARD: &str = "*";

/// An ordered sequence of path segments; empty means the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<String>);

impl Path {
    /// The root path `/`.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Build a path from owned segments. Segments must be non-empty.
    pub fn new(segments: Vec<String>) -> Self {
        Path(segments)
    }

    /// Parse a path of the form `/a/b/c`. `/` parses to the root.
    ///
    /// Fails on strings that do not start with `/` and on empty segments
    /// (`//`, trailing `/`).
    pub fn parse(s: &str) -> Result<Self> {
        if s == "/" {
            return Ok(Path::root());
        }
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| StoreError::internal(format!("invalid path {s:?}: must start with '/'")))?;
        let mut segments = Vec::new();
        for seg in rest.split('/') {
            if seg.is_empty() {
                return Err(StoreError::internal(format!(
                    "invalid path {s:?}: empty segment"
                )));
            }
            segments.push(seg.to_string());
        }
        Ok(Path(segments))
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no segments; same as [`is_root`](Self::is_root).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The path extended by one segment.
    pub fn child(&self, segment: &str) -> Path {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Path(segments)
    }

    /// The first `n` segments as a path. `n` must not exceed `len()`.
    pub fn prefix(&self, n: usize) -> Path {
        Path(self.0[..n].to_vec())
    }

    /// Index of the first wildcard segment, if any.
    pub fn wildcard_index(&self) -> Option<usize> {
        self.0.iter().position(|seg| seg == WILDCARD)
    }

    /// True if `other` matches the leading segments of this path, treating
    /// wildcards in `other` as any literal segment.
    pub fn matches_prefix(&self, pattern: &Path) -> bool {
        if pattern.len() > self.len() {
            return false;
        }
        self.0
            .iter()
            .zip(pattern.iter())
            .all(|(seg, pat)| pat == WILDCARD || seg == pat)
    }
}

impl Deref for Path {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.0 {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Path::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        let p = Path::parse("/").unwrap();
        assert!(p.is_root());
        assert_eq!(p.len(), 0);
        assert_eq!(p.to_string(), "/");
    }

    #[test]
    fn test_parse_segments() {
        let p = Path::parse("/foo/bar").unwrap();
        assert_eq!(p.segments(), &["foo".to_string(), "bar".to_string()]);
        assert_eq!(p.to_string(), "/foo/bar");
    }

    #[test]
    fn test_parse_rejects_missing_slash() {
        assert!(Path::parse("foo/bar").is_err());
        assert!(Path::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        assert!(Path::parse("/foo//bar").is_err());
        assert!(Path::parse("/foo/").is_err());
    }

    #[test]
    fn test_child_and_prefix() {
        let p = Path::parse("/a/b").unwrap();
        assert_eq!(p.child("c").to_string(), "/a/b/c");
        assert_eq!(p.prefix(1).to_string(), "/a");
        assert_eq!(p.prefix(0), Path::root());
    }

    #[test]
    fn test_wildcard_index() {
        assert_eq!(Path::parse("/tenants/*").unwrap().wildcard_index(), Some(1));
        assert_eq!(
            Path::parse("/tenants/*/users/*").unwrap().wildcard_index(),
            Some(1)
        );
        assert_eq!(Path::parse("/tenants/abc").unwrap().wildcard_index(), None);
    }

    #[test]
    fn test_matches_prefix() {
        let pattern = Path::parse("/tenants/*").unwrap();
        assert!(Path::parse("/tenants/abc").unwrap().matches_prefix(&pattern));
        assert!(Path::parse("/tenants/abc/users")
            .unwrap()
            .matches_prefix(&pattern));
        assert!(!Path::parse("/tenants").unwrap().matches_prefix(&pattern));
        assert!(!Path::parse("/users/abc").unwrap().matches_prefix(&pattern));
    }

    #[test]
    fn test_serde_round_trip() {
        let p = Path::parse("/tenants/*").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"/tenants/*\"");
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_segment_may_contain_slash_when_built_directly() {
        // Parsing cannot produce such a segment, but the type allows it; the
        // key layer escapes it.
        let p = Path::new(vec!["a/b".to_string()]);
        assert_eq!(p.len(), 1);
    }
}
