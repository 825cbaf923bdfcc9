//! Query and save parameter types
//!
//! Plain-data request types for the [`Tagbase`](crate::database::Tagbase)
//! operations. All of them default to sensible values; builder-style methods
//! consume and return the value for fluent construction.

use tagbase_core::{Order, ScoreRange, Where};

/// Default page size for `filter` and `tags` queries
pub const DEFAULT_QUERY_LIMIT: usize = 20;

/// Parameters for `filter` and `tags`
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Tag expression selecting entries (default: everything)
    pub filter: Where,
    /// Number of leading results to skip
    pub offset: usize,
    /// Maximum number of results to return
    pub limit: usize,
    /// Score ordering of the results
    pub ordering: Order,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            filter: Where::Everything,
            offset: 0,
            limit: DEFAULT_QUERY_LIMIT,
            ordering: Order::Ascending,
        }
    }
}

impl Query {
    /// Query with a tag expression and default paging
    pub fn filtered(filter: impl Into<Where>) -> Self {
        Query {
            filter: filter.into(),
            ..Query::default()
        }
    }

    /// Set the offset
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Set the limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Return highest scores first
    pub fn descending(mut self) -> Self {
        self.ordering = Order::Descending;
        self
    }
}

/// Parameters for `count`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CountQuery {
    /// Tag expression selecting entries (default: everything)
    pub filter: Where,
    /// Inclusive score range (default: unbounded)
    pub range: ScoreRange,
}

impl CountQuery {
    /// Count with a tag expression and an unbounded score range
    pub fn filtered(filter: impl Into<Where>) -> Self {
        CountQuery {
            filter: filter.into(),
            ..CountQuery::default()
        }
    }

    /// Restrict the counted score range
    pub fn range(mut self, range: ScoreRange) -> Self {
        self.range = range;
        self
    }
}

/// Options for `save` and `save_new`
///
/// `tags` defaults to the root tag only; `sort_by` derives the entry's score
/// from its value, falling back to the save-time timestamp in milliseconds;
/// `ttl_secs` overrides the configured default expiration.
pub struct SaveOptions<V> {
    /// Tag paths to index the entry under (empty means root only)
    pub tags: Vec<String>,
    /// Score derivation from the value; save-time milliseconds when absent
    pub sort_by: Option<fn(&V) -> f64>,
    /// Entry expiration in seconds, overriding the configured default
    pub ttl_secs: Option<u64>,
}

impl<V> Default for SaveOptions<V> {
    fn default() -> Self {
        SaveOptions {
            tags: Vec::new(),
            sort_by: None,
            ttl_secs: None,
        }
    }
}

impl<V> Clone for SaveOptions<V> {
    fn clone(&self) -> Self {
        SaveOptions {
            tags: self.tags.clone(),
            sort_by: self.sort_by,
            ttl_secs: self.ttl_secs,
        }
    }
}

impl<V> SaveOptions<V> {
    /// Options with defaults: root tag only, timestamp score, no TTL
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag path to index the entry under
    pub fn tag(mut self, path: impl Into<String>) -> Self {
        self.tags.push(path.into());
        self
    }

    /// Add several tag paths
    pub fn tags<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Derive the entry's score from its value
    pub fn sort_by(mut self, f: fn(&V) -> f64) -> Self {
        self.sort_by = Some(f);
        self
    }

    /// Expire the entry after `ttl_secs` seconds (minimum 1)
    pub fn ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = Some(ttl_secs);
        self
    }
}
