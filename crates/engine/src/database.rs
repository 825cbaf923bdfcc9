//! The Tagbase database facade
//!
//! [`Tagbase`] is a stateless facade over a [`StoreBackend`]: it holds no
//! data beyond its key space and configuration, so multiple instances over
//! the same backend are safe and concurrent calls never block each other in
//! process. Cross-command atomicity is delegated entirely to the store's
//! batch execution.

use crate::config::{validate_ttl, Config};
use crate::index;
use crate::query::{CountQuery, Query, SaveOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tagbase_core::{Entry, KeySpace, Order, Result, Tag, Where};
use tagbase_store::{MemoryStore, Pipeline, StoreBackend};
use tracing::debug;
use uuid::Uuid;

/// A tagged database of serializable values over a store backend
///
/// Generic over the value type `V` (serialized as JSON) and the backend
/// `S`, selected explicitly at construction time.
///
/// # Example
///
/// ```
/// use tagbase_engine::{SaveOptions, Query, Tagbase};
///
/// let db: Tagbase<String> = Tagbase::in_memory("cache");
/// db.save("id1", &"hello".to_string(), SaveOptions::new().tag("greetings"))?;
///
/// let hits = db.filter(&Query::filtered("greetings"))?;
/// assert_eq!(hits.len(), 1);
/// # tagbase_core::Result::Ok(())
/// ```
pub struct Tagbase<V, S = MemoryStore> {
    pub(crate) store: S,
    pub(crate) keys: KeySpace,
    pub(crate) config: Config,
    _value: PhantomData<fn() -> V>,
}

impl<V> Tagbase<V, MemoryStore>
where
    V: Serialize + DeserializeOwned,
{
    /// Create a database over a fresh in-memory backend
    pub fn in_memory(database: impl Into<String>) -> Self {
        Self::new(database, MemoryStore::new())
    }
}

impl<V, S> Tagbase<V, S>
where
    V: Serialize + DeserializeOwned,
    S: StoreBackend,
{
    /// Create a database over an explicit backend with default configuration
    pub fn new(database: impl Into<String>, store: S) -> Self {
        let config = Config::default();
        Tagbase {
            keys: KeySpace::new(config.key_prefix.clone(), database),
            store,
            config,
            _value: PhantomData,
        }
    }

    /// Create a database with a custom configuration
    ///
    /// Fails when the configuration carries an invalid TTL.
    pub fn with_config(database: impl Into<String>, store: S, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Tagbase {
            keys: KeySpace::new(config.key_prefix.clone(), database),
            store,
            config,
            _value: PhantomData,
        })
    }

    /// Name of this database
    pub fn database(&self) -> &str {
        self.keys.database()
    }

    /// Configuration in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Backend reference (for callers that share one store across databases)
    pub fn store(&self) -> &S {
        &self.store
    }

    // === Entries ===

    /// Fetch an entry's value, `None` if absent or expired
    pub fn get(&self, id: &str) -> Result<Option<V>> {
        match self.store.get(&self.keys.entry_key(id))? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Save an entry under the given id, replacing any previous value
    ///
    /// The value is indexed under every tag in `opts.tags` and all their
    /// ancestors (the root when no tags are given), all within one atomic
    /// batch. Re-saving an id never duplicates it within a tag's sorted
    /// set; the new score wins.
    pub fn save(&self, id: &str, value: &V, opts: SaveOptions<V>) -> Result<()> {
        let tags = if opts.tags.is_empty() {
            vec![String::new()]
        } else {
            opts.tags
        };
        let score = match opts.sort_by {
            Some(f) => f(value),
            None => now_millis(),
        };
        let ttl_secs = match opts.ttl_secs.or(self.config.default_ttl_secs) {
            Some(ttl) => Some(validate_ttl(ttl)?),
            None => None,
        };
        let raw = serde_json::to_vec(value)?;
        debug!(id, tags = ?tags, score, "saving entry");

        let mut pipe = Pipeline::new().set(self.keys.entry_key(id), raw);
        for path in &tags {
            pipe = index::index_entry(pipe, &self.keys, &Tag::from_path(path), id, score);
        }
        // Tag-set keys are never expired; only the entry's value is.
        if let Some(ttl) = ttl_secs {
            pipe = pipe.expire(self.keys.entry_key(id), ttl);
        }
        self.store.exec(pipe)
    }

    /// Save a value under a generated identifier, returning the id
    pub fn save_new(&self, value: &V, opts: SaveOptions<V>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.save(&id, value, opts)?;
        Ok(id)
    }

    /// Delete an entry and unwind all of its tag memberships
    ///
    /// Reads the entry's membership set, removes the id from every per-tag
    /// sorted set along every recorded chain (root included; duplicate
    /// removals across shared ancestors are harmless), then deletes the
    /// entry and its membership set — one atomic batch. Deleting a missing
    /// id is a no-op.
    pub fn delete(&self, id: &str) -> Result<()> {
        let membership_key = self.keys.entry_tags_key(id);
        let paths = self.store.smembers(&membership_key)?;
        debug!(id, memberships = paths.len(), "deleting entry");

        let mut pipe = Pipeline::new().del(vec![self.keys.entry_key(id)]);
        for path in &paths {
            pipe = index::unindex_entry(pipe, &self.keys, &Tag::from_path(path), id);
        }
        self.store.exec(pipe.del(vec![membership_key]))
    }

    /// Remaining time to live of an entry in seconds
    ///
    /// `None` when the entry has no expiration or does not exist.
    pub fn ttl(&self, id: &str) -> Result<Option<u64>> {
        let ttl = self.store.ttl(&self.keys.entry_key(id))?;
        Ok(if ttl < 0 { None } else { Some(ttl as u64) })
    }

    // === Queries ===

    /// List entries matching a tag expression, paged and ordered by score
    ///
    /// Entries whose value has expired between indexing and the read are
    /// dropped from the result.
    pub fn filter(&self, query: &Query) -> Result<Vec<Entry<V>>> {
        let ids = self.query_ids(query)?;
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(raw) = self.store.get(&self.keys.entry_key(&id))? {
                entries.push(Entry {
                    id,
                    value: serde_json::from_slice(&raw)?,
                });
            }
        }
        Ok(entries)
    }

    /// List child tag names under a tag expression
    ///
    /// The expression may name a single tag (listing its immediate
    /// children) or an OR combination (listing the union of their
    /// children). AND terms are not supported here.
    pub fn tags(&self, query: &Query) -> Result<Vec<String>> {
        let tag = self.resolve_tags_filter(&query.filter)?;
        let (start, stop) = page_bounds(query.offset, query.limit);
        self.store
            .zrange(&self.keys.tag_children_key(&tag), start, stop, query.ordering)
    }

    /// Count entries matching a tag expression, optionally score-bounded
    pub fn count(&self, query: &CountQuery) -> Result<u64> {
        let tag = self.resolve_entries_filter(&query.filter)?;
        self.store.zcount(&self.keys.tag_key(&tag), query.range)
    }

    // === Bulk deletion ===

    /// Delete every entry matching a tag expression
    ///
    /// Matching ids are collected page by page up front, then deleted one
    /// entry at a time, so the scan is not perturbed by its own deletions.
    /// No snapshot isolation is provided: entries saved concurrently with
    /// matching tags may or may not be included.
    ///
    /// When the expression denotes an unambiguous tag set (a bare path, an
    /// OR-only expression, or a single-element AND), the now-empty tag
    /// nodes and their children registries are torn down recursively,
    /// children first. Mixed AND/OR expressions skip the teardown because
    /// other entries may still reference those tags.
    ///
    /// Returns the number of entries deleted.
    pub fn clear(&self, filter: &Where) -> Result<u64> {
        let total = self.count(&CountQuery {
            filter: filter.clone(),
            ..CountQuery::default()
        })?;
        debug!(?filter, total, "clearing entries");

        let page = self.config.deletion_page_size;
        let mut victims: Vec<String> = Vec::with_capacity(total as usize);
        while (victims.len() as u64) < total {
            let ids = self.query_ids(&Query {
                filter: filter.clone(),
                offset: victims.len(),
                limit: page,
                ordering: Order::Ascending,
            })?;
            if ids.is_empty() {
                break;
            }
            victims.extend(ids);
        }

        for id in &victims {
            self.delete(id)?;
        }

        for path in cleanup_paths(filter) {
            self.delete_tag_tree(&Tag::from_path(&path))?;
        }
        Ok(victims.len() as u64)
    }

    /// Recursively delete a tag's sorted set and children registry
    ///
    /// Children are torn down before their parent; each tag node is removed
    /// in its own atomic batch.
    fn delete_tag_tree(&self, tag: &Tag) -> Result<()> {
        let children_key = self.keys.tag_children_key(tag);
        let children = self
            .store
            .zrange(&children_key, 0, -1, Order::Ascending)?;
        for child in children {
            self.delete_tag_tree(&Tag::from_path(&child))?;
        }
        self.store
            .exec(Pipeline::new().del(vec![self.keys.tag_key(tag), children_key]))
    }

    /// Ids matching a query, in score order
    pub(crate) fn query_ids(&self, query: &Query) -> Result<Vec<String>> {
        let tag = self.resolve_entries_filter(&query.filter)?;
        let (start, stop) = page_bounds(query.offset, query.limit);
        self.store
            .zrange(&self.keys.tag_key(&tag), start, stop, query.ordering)
    }
}

/// Inclusive rank bounds for a page (`ZRANGE` stop is inclusive)
fn page_bounds(offset: usize, limit: usize) -> (i64, i64) {
    (offset as i64, offset as i64 + limit as i64 - 1)
}

/// Tag paths whose nodes can be torn down after a `clear`
///
/// A bare path (the root included) or an OR-only expression names exactly
/// the tags that were emptied; a single-element AND does too. Multi-term
/// combinations are ambiguous — other entries may still live under the
/// individual tags — so nothing is returned for them.
fn cleanup_paths(filter: &Where) -> Vec<String> {
    match filter {
        Where::Everything => vec![String::new()],
        Where::Path(path) => vec![path.clone()],
        Where::Query { and, or } => {
            if !and.is_empty() && !or.is_empty() {
                Vec::new()
            } else if and.is_empty() {
                or.clone()
            } else if and.len() == 1 {
                and.clone()
            } else {
                Vec::new()
            }
        }
    }
}

/// Current wall-clock time in milliseconds, the default score unit
fn now_millis() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds_inclusive() {
        assert_eq!(page_bounds(0, 20), (0, 19));
        assert_eq!(page_bounds(40, 10), (40, 49));
    }

    #[test]
    fn test_page_bounds_zero_limit_is_empty_range() {
        let (start, stop) = page_bounds(5, 0);
        assert!(start > stop);
    }

    #[test]
    fn test_cleanup_paths_bare_path() {
        assert_eq!(cleanup_paths(&Where::path("foo")), vec!["foo"]);
        assert_eq!(cleanup_paths(&Where::Everything), vec![String::new()]);
    }

    #[test]
    fn test_cleanup_paths_or_only() {
        assert_eq!(
            cleanup_paths(&Where::any_of(["a", "b"])),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_cleanup_paths_single_and() {
        assert_eq!(cleanup_paths(&Where::all_of(["a"])), vec!["a".to_string()]);
    }

    #[test]
    fn test_cleanup_paths_ambiguous_combinations_skip() {
        assert!(cleanup_paths(&Where::all_of(["a", "b"])).is_empty());
        assert!(cleanup_paths(&Where::Query {
            and: vec!["a".to_string(), "b".to_string()],
            or: vec!["c".to_string(), "d".to_string()],
        })
        .is_empty());
    }

    #[test]
    fn test_now_millis_is_epoch_scaled() {
        // Sanity: the default score unit is milliseconds, not seconds
        let now = now_millis();
        assert!(now > 1.0e12);
    }
}
