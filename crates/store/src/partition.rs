//! Partition patterns: the normalized set and the classification trie.
//!
//! A partition pattern declares that values under its matches are stored as
//! individual keys, one per immediate child of a fully-resolved match.
//! Paths matched by no pattern collapse into a key one segment past where
//! they diverge from the pattern set, so unpartitioned values live at the
//! shortest enclosing root.

use quarry_core::{Path, WILDCARD};
use std::collections::HashMap;

/// A normalized (sorted) set of partition patterns.
#[derive(Debug, Clone, Default)]
pub(crate) struct PathSet(Vec<Path>);

impl PathSet {
    pub fn new(mut paths: Vec<Path>) -> Self {
        paths.sort();
        PathSet(paths)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, path: Path) {
        self.0.push(path);
        self.0.sort();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains(path)
    }

    /// Patterns in `self` that are not in `other`.
    pub fn diff(&self, other: &PathSet) -> Vec<Path> {
        self.0
            .iter()
            .filter(|p| !other.contains(p))
            .cloned()
            .collect()
    }

    /// True when no pattern is a (wildcard-aware) prefix of another.
    ///
    /// Duplicates count as overlapping.
    pub fn is_disjoint(&self) -> bool {
        for (i, a) in self.0.iter().enumerate() {
            for b in self.0.iter().skip(i + 1) {
                if overlaps(a, b) {
                    return false;
                }
            }
        }
        true
    }

    pub fn to_vec(&self) -> Vec<Path> {
        self.0.clone()
    }
}

/// True when one pattern is a prefix of the other with `*` matching any
/// literal segment.
fn overlaps(a: &Path, b: &Path) -> bool {
    let n = a.len().min(b.len());
    for i in 0..n {
        let (x, y) = (&a[i], &b[i]);
        if x != y && x != WILDCARD && y != WILDCARD {
            return false;
        }
    }
    true
}

/// Classification trie built from the partition set at open time.
#[derive(Debug, Default)]
pub(crate) struct PartitionTrie {
    children: HashMap<String, PartitionTrie>,
}

impl PartitionTrie {
    pub fn build(partitions: &PathSet) -> Self {
        let mut root = PartitionTrie::default();
        for partition in partitions.iter() {
            root.insert(partition.segments());
        }
        root
    }

    fn insert(&mut self, segments: &[String]) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        self.children.entry(head.clone()).or_default().insert(rest);
    }

    /// Classify `path` against the pattern set.
    ///
    /// Walks the trie segment by segment, following literal children first
    /// and `*` children otherwise. Two outcomes:
    ///
    /// - `(i + 1, None)`: the walk stopped at segment `i` (the path diverged
    ///   from every pattern, or ran past a fully matched one). The key for
    ///   this path consumes `i + 1` leading segments; any remaining suffix
    ///   is stored inside the value at that key.
    /// - `(path.len(), Some(node))`: the whole path lies inside the trie, at
    ///   or above the split frontier; reads fan out beneath it.
    pub fn find<'t>(&'t self, path: &Path) -> (usize, Option<&'t PartitionTrie>) {
        let mut node = self;
        for (i, seg) in path.iter().enumerate() {
            let next = node
                .children
                .get(seg)
                .or_else(|| node.children.get(WILDCARD));
            match next {
                Some(child) => node = child,
                None => return (i + 1, None),
            }
        }
        (path.len(), Some(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn set(paths: &[&str]) -> PathSet {
        PathSet::new(paths.iter().map(|s| path(s)).collect())
    }

    #[test]
    fn test_disjoint_siblings() {
        assert!(set(&["/foo/bar", "/foo/baz"]).is_disjoint());
    }

    #[test]
    fn test_prefix_overlap_rejected() {
        assert!(!set(&["/foo", "/foo/bar"]).is_disjoint());
    }

    #[test]
    fn test_wildcard_overlap_rejected() {
        assert!(!set(&["/tenants/*", "/tenants/abc"]).is_disjoint());
        assert!(!set(&["/tenants/*", "/tenants/abc/users"]).is_disjoint());
    }

    #[test]
    fn test_duplicates_overlap() {
        assert!(!set(&["/foo", "/foo"]).is_disjoint());
    }

    #[test]
    fn test_diff() {
        let old = set(&["/a", "/b"]);
        let new = set(&["/b", "/c"]);
        assert_eq!(old.diff(&new), vec![path("/a")]);
        assert_eq!(new.diff(&old), vec![path("/c")]);
    }

    #[test]
    fn test_find_unpartitioned_root_child() {
        // No user partitions: a top-level path collapses into one key.
        let trie = PartitionTrie::build(&set(&["/system/*"]));
        let (depth, node) = trie.find(&path("/qux/deep/value"));
        assert_eq!(depth, 1);
        assert!(node.is_none());
    }

    #[test]
    fn test_find_divergence_inside_pattern() {
        // {/foo/bar}: /foo/baz/... diverges at index 1, key is /foo/baz.
        let trie = PartitionTrie::build(&set(&["/foo/bar"]));
        let (depth, node) = trie.find(&path("/foo/baz/qux"));
        assert_eq!(depth, 2);
        assert!(node.is_none());

        // /foo/bar/abcd is a child of the full match: its own key.
        let (depth, node) = trie.find(&path("/foo/bar/abcd"));
        assert_eq!(depth, 3);
        assert!(node.is_none());

        // Deeper paths collapse into the child-of-match key.
        let (depth, node) = trie.find(&path("/foo/bar/abcd/x/y"));
        assert_eq!(depth, 3);
        assert!(node.is_none());
    }

    #[test]
    fn test_find_at_and_above_frontier() {
        let trie = PartitionTrie::build(&set(&["/tenants/*"]));
        for p in ["/", "/tenants", "/tenants/acme"] {
            let target = path(p);
            let (depth, node) = trie.find(&target);
            assert_eq!(depth, target.len(), "path {p}");
            assert!(node.is_some(), "path {p}");
        }
    }

    #[test]
    fn test_find_wildcard_expansion() {
        let trie = PartitionTrie::build(&set(&["/tenants/*"]));
        let (depth, node) = trie.find(&path("/tenants/acme/users/alice"));
        assert_eq!(depth, 3);
        assert!(node.is_none());
    }

    #[test]
    fn test_find_multi_wildcard() {
        let trie = PartitionTrie::build(&set(&["/tenants/*/users/*"]));
        // Still inside the trie.
        let (depth, node) = trie.find(&path("/tenants/acme/users/alice"));
        assert_eq!(depth, 4);
        assert!(node.is_some());
        // One past the second wildcard: individual key.
        let (depth, node) = trie.find(&path("/tenants/acme/users/alice/roles"));
        assert_eq!(depth, 5);
        assert!(node.is_none());
        // Divergence between the wildcards.
        let (depth, node) = trie.find(&path("/tenants/acme/groups/g1"));
        assert_eq!(depth, 3);
        assert!(node.is_none());
    }
}
