//! Key schema
//!
//! Pure, stateless derivation of store keys from (prefix, database, id, tag).
//! Nothing here performs I/O; malformed tag paths are handled during
//! [`Tag`] construction, not here.
//!
//! ## Persisted layout
//!
//! With global prefix `P`, database `D`, entry id `I` and tag name `T`:
//!
//! - `P:D:I` — entry value (serialized blob)
//! - `P:D:I/tags` — set of tag path strings the entry was saved under
//! - `P:D:tag:T` — sorted set of entry ids under tag `T` and its subtree
//!   (root: `P:D:tag`, containing every entry in the database)
//! - `P:D:tag:T:children` — sorted set of `T`'s immediate child tag names

use crate::tag::Tag;

/// Key derivation schema for one logical database
///
/// A `KeySpace` is a pure value; cloning it is cheap and two key spaces with
/// the same prefix and database derive identical keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
    database: String,
}

impl KeySpace {
    /// Create a key space for a database under a global key prefix
    ///
    /// The prefix may be empty; keys are still colon-joined, matching the
    /// layout above.
    pub fn new(prefix: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            database: database.into(),
        }
    }

    /// Name of the database this key space derives keys for
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Key holding an entry's serialized value
    pub fn entry_key(&self, id: &str) -> String {
        format!("{}:{}:{}", self.prefix, self.database, id)
    }

    /// Key holding the set of tag paths an entry was saved under
    pub fn entry_tags_key(&self, id: &str) -> String {
        format!("{}/tags", self.entry_key(id))
    }

    /// Key holding a tag's sorted set of entry ids
    pub fn tag_key(&self, tag: &Tag) -> String {
        format!("{}:{}:{}", self.prefix, self.database, tag.key_fragment())
    }

    /// Key holding a tag's children registry
    pub fn tag_children_key(&self, tag: &Tag) -> String {
        format!("{}:children", self.tag_key(tag))
    }
}
