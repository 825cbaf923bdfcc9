//! Hierarchical tags
//!
//! A [`Tag`] is an immutable slash-delimited path used to index entries. Tags
//! form an implicit tree through path-prefix ancestry: `"a/b/c"` is a child of
//! `"a/b"`, which is a child of `"a"`, which is a child of the root. The root
//! tag has the empty name and contains every entry in a database.
//!
//! ## Contract
//!
//! - Tags are pure values: equality is structural, by canonical name. No
//!   identity-based root singleton exists; `Tag::root()` returns the same
//!   value everywhere.
//! - Parents are recomputed on demand from the name instead of being stored
//!   as object links, so tags are cheap to clone and carry no shared state.
//! - A single trailing separator is stripped during parsing (`"test/"` parses
//!   as `"test"`). The empty string and a bare `"/"` both denote the root.

use std::fmt;

/// Path separator for hierarchical tag names
pub const TAG_SEPARATOR: char = '/';

/// An immutable hierarchical tag
///
/// The empty name denotes the root tag. Non-root names are `/`-delimited
/// paths whose ancestor chain is fully determined by dropping trailing
/// segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    name: String,
}

impl Tag {
    /// The root tag, ancestor of every tag
    pub fn root() -> Self {
        Tag {
            name: String::new(),
        }
    }

    /// Parse a tag from a slash-delimited path
    ///
    /// A single trailing separator is stripped: `"test/"` parses as `"test"`.
    /// The empty string and `"/"` both denote the root tag. A leading
    /// separator is kept as part of the name (`"/a/b"` has ancestor `"/a"`,
    /// whose parent is the root).
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbase_core::Tag;
    ///
    /// assert!(Tag::from_path("").is_root());
    /// assert!(Tag::from_path("/").is_root());
    /// assert_eq!(Tag::from_path("test/").name(), "test");
    /// assert_eq!(Tag::from_path("a/b").parent(), Some(Tag::from_path("a")));
    /// ```
    pub fn from_path(path: &str) -> Self {
        let name = path.strip_suffix(TAG_SEPARATOR).unwrap_or(path);
        Tag {
            name: name.to_string(),
        }
    }

    /// Canonical name of this tag (empty for the root)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the root tag
    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// Parent tag, or `None` for the root
    ///
    /// Computed by dropping the last path segment. A single-segment tag's
    /// parent is the root.
    pub fn parent(&self) -> Option<Tag> {
        if self.is_root() {
            return None;
        }
        match self.name.rfind(TAG_SEPARATOR) {
            Some(idx) => Some(Tag {
                name: self.name[..idx].to_string(),
            }),
            None => Some(Tag::root()),
        }
    }

    /// Iterate over this tag and every ancestor, ending at the root
    ///
    /// Yields `self` first, then each parent in turn, and finally the root.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    /// Key fragment identifying this tag within a database's key space
    ///
    /// The root maps to the bare `tag` fragment; every other tag maps to
    /// `tag:{name}`. The `tag` segment keeps tag keys from colliding with
    /// entry data keys in the same database.
    pub fn key_fragment(&self) -> String {
        if self.is_root() {
            "tag".to_string()
        } else {
            format!("tag:{}", self.name)
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Iterator over a tag's ancestor chain, from the tag itself up to the root
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<Tag>,
}

impl Iterator for Ancestors {
    type Item = Tag;

    fn next(&mut self) -> Option<Tag> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}
