//! Tagbase - tag-indexed storage over sorted-set key-value primitives
//!
//! Tagbase stores JSON-serializable values under hierarchical slash-delimited
//! tags and answers tag queries from precomputed sorted-set indexes: saving
//! an entry registers it under every level of each tag's ancestor chain, so
//! filtering by `"fruits"` finds entries tagged `"fruits/citrus/lemon"`
//! without any scanning.
//!
//! # Quick Start
//!
//! ```
//! use tagbase::{Query, SaveOptions, Tagbase, Where};
//!
//! let db: Tagbase<String> = Tagbase::in_memory("pantry");
//!
//! db.save(
//!     "lemon",
//!     &"sour".to_string(),
//!     SaveOptions::new().tag("fruits/citrus"),
//! )?;
//! db.save(
//!     "apple",
//!     &"crisp".to_string(),
//!     SaveOptions::new().tag("fruits/pome"),
//! )?;
//!
//! // Ancestor tags match their whole subtree
//! let fruits = db.filter(&Query::filtered("fruits"))?;
//! assert_eq!(fruits.len(), 2);
//!
//! // Boolean combinations resolve through cached aggregate sets
//! let citrus_or_pome = db.filter(&Query::filtered(Where::any_of([
//!     "fruits/citrus",
//!     "fruits/pome",
//! ])))?;
//! assert_eq!(citrus_or_pome.len(), 2);
//! # tagbase::Result::Ok(())
//! ```
//!
//! # Architecture
//!
//! Three layers, each its own crate:
//!
//! - `tagbase-core`: tags, key schema, query expressions, errors. Pure
//!   values, no I/O.
//! - `tagbase-store`: the [`StoreBackend`] capability trait, the batched
//!   [`Pipeline`] write path, and the [`MemoryStore`] reference backend.
//! - `tagbase-engine`: [`Tagbase`] itself — indexing walks, the AND/OR
//!   query planner with TTL-cached aggregates, and entry lifecycle.
//!
//! Alternative backends implement [`StoreBackend`] and are selected at
//! construction time via [`Tagbase::new`].

pub use tagbase_core::{
    Entry, Error, KeySpace, Order, Result, ScoreBound, ScoreRange, Tag, Where, TAG_SEPARATOR,
};
pub use tagbase_engine::{Config, CountQuery, Query, SaveOptions, Tagbase, DEFAULT_QUERY_LIMIT};
pub use tagbase_store::{
    Aggregate, Command, ErrorPolicy, MemoryStore, Pipeline, StoreBackend, TTL_MISSING,
    TTL_PERSISTENT,
};
