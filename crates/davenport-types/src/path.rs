//! Hierarchical resource paths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A location in the resource hierarchy, held as an ordered sequence of
/// path segments.
///
/// Parsing is total: any input string yields a usable path, so the type can
/// sit directly on the request-parsing hot path. The root is represented as
/// a single empty segment (the form [`DavPath::parse`] produces) or as an
/// empty sequence (reachable through [`DavPath::from_segments`] and
/// [`DavPath::remove_root`]); both forms answer [`DavPath::is_root`].
///
/// A path exclusively owns its segment sequence; [`Clone`] copies it and
/// never aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DavPath {
    segments: Vec<String>,
}

impl DavPath {
    /// Parses a slash-delimited path string.
    ///
    /// Consecutive separators are collapsed, then at most one leading and
    /// one trailing separator are stripped before splitting. Never fails:
    /// the empty string and `"/"` both yield a root path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut flat = raw.to_owned();
        while let Some(index) = flat.find("//") {
            flat.remove(index);
        }
        let trimmed = flat.strip_prefix('/').unwrap_or(&flat);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        Self {
            segments: trimmed.split('/').map(str::to_owned).collect(),
        }
    }

    /// Wraps an existing segment sequence without copying.
    #[must_use]
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Returns true when the path addresses the hierarchy root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
            || (self.segments.len() == 1 && self.segments.first().is_some_and(String::is_empty))
    }

    /// Returns the final segment (the file name), if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the first segment (the root name), if any.
    #[must_use]
    pub fn root_name(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Returns the second-to-last segment (the parent's name).
    ///
    /// `None` when the path has no parent (fewer than two segments).
    #[must_use]
    pub fn parent_name(&self) -> Option<&str> {
        self.segments
            .len()
            .checked_sub(2)
            .and_then(|index| self.segments.get(index))
            .map(String::as_str)
    }

    /// Returns true when the path has at least two segments.
    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.segments.len() >= 2
    }

    /// Returns a new path over all segments except the last.
    #[must_use]
    pub fn parent(&self) -> Self {
        match self.segments.split_last() {
            Some((_, rest)) => Self {
                segments: rest.to_vec(),
            },
            None => Self {
                segments: Vec::new(),
            },
        }
    }

    /// Drops the leading segment in place, used during routing descent.
    ///
    /// Calling this on a root path is a no-op.
    pub fn remove_root(&mut self) {
        if !self.is_root() {
            self.segments.remove(0);
        }
    }

    /// Returns a new path with `name` appended; the receiver is unchanged.
    ///
    /// Appending to the root yields a single-segment path rather than
    /// carrying the root's empty marker segment along.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut path = self.clone();
        if path.is_root() {
            path.segments.clear();
        }
        path.segments.push(name.to_owned());
        path
    }

    /// Returns the segment sequence.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DavPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "/{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collapses_separator_runs() {
        assert_eq!(DavPath::parse("//a///b//"), DavPath::parse("/a/b"));
        assert_eq!(DavPath::parse("/a//b").segments(), ["a", "b"]);
    }

    #[test]
    fn parse_is_idempotent() {
        for raw in ["", "/", "//", "/a", "a/b/", "//a///b//c", "/deep/er/est/"] {
            let once = DavPath::parse(raw);
            let twice = DavPath::parse(&once.to_string());
            assert_eq!(once, twice, "parse not idempotent for {raw:?}");
        }
    }

    #[test]
    fn root_forms() {
        assert!(DavPath::parse("/").is_root());
        assert!(DavPath::parse("").is_root());
        assert!(DavPath::from_segments(Vec::new()).is_root());
        assert!(!DavPath::parse("/a/b").is_root());
    }

    #[test]
    fn root_displays_as_slash() {
        assert_eq!(DavPath::parse("/").to_string(), "/");
        assert_eq!(DavPath::from_segments(Vec::new()).to_string(), "/");
        assert_eq!(DavPath::parse("/a/b").to_string(), "/a/b");
    }

    #[test]
    fn name_accessors() {
        let path = DavPath::parse("/var/spool/mail");
        assert_eq!(path.file_name(), Some("mail"));
        assert_eq!(path.root_name(), Some("var"));
        assert_eq!(path.parent_name(), Some("spool"));
    }

    #[test]
    fn parent_name_absent_without_parent() {
        assert_eq!(DavPath::parse("/only").parent_name(), None);
        assert_eq!(DavPath::from_segments(Vec::new()).parent_name(), None);
    }

    #[test]
    fn has_parent_matches_segment_count() {
        for raw in ["", "/", "/a", "/a/b", "/a/b/c"] {
            let path = DavPath::parse(raw);
            assert_eq!(path.has_parent(), path.segments().len() >= 2, "{raw:?}");
        }
    }

    #[test]
    fn parent_drops_last_segment() {
        let path = DavPath::parse("/a/b/c");
        assert_eq!(path.parent(), DavPath::parse("/a/b"));
        assert!(DavPath::parse("/a").parent().is_root());
    }

    #[test]
    fn child_never_mutates_receiver() {
        let path = DavPath::parse("/a/b");
        let before = path.to_string();
        let child = path.child("c");
        assert_eq!(path.to_string(), before);
        assert_eq!(child, DavPath::parse("/a/b/c"));
    }

    #[test]
    fn child_of_root_is_single_segment() {
        let child = DavPath::parse("/").child("top");
        assert_eq!(child, DavPath::parse("/top"));
        assert_eq!(child.to_string(), "/top");
    }

    #[test]
    fn remove_root_descends() {
        let mut path = DavPath::parse("/a/b/c");
        path.remove_root();
        assert_eq!(path, DavPath::parse("/b/c"));
        path.remove_root();
        path.remove_root();
        assert!(path.is_root());
    }

    #[test]
    fn remove_root_on_root_is_noop() {
        let mut path = DavPath::parse("/");
        path.remove_root();
        assert!(path.is_root());

        let mut empty = DavPath::from_segments(Vec::new());
        empty.remove_root();
        assert!(empty.is_root());
    }
}
