//! Tag/index engine for Tagbase
//!
//! This crate turns the store adapter's primitives into a tagged database:
//!
//! - [`Tagbase`]: the per-database facade — save, get, delete, clear,
//!   filter, tags, count, ttl
//! - [`Config`]: TTLs, aggregate caching, deletion paging, key prefix
//! - indexing: the leaf-to-root ancestor walk that registers an entry under
//!   every level of every tag it was saved with, in one atomic batch
//! - planning: resolution of AND/OR tag expressions into one concrete tag,
//!   materializing cached union/intersection aggregates on demand

pub mod config;
pub mod database;
mod index;
mod planner;
pub mod query;

pub use config::Config;
pub use database::Tagbase;
pub use query::{CountQuery, Query, SaveOptions, DEFAULT_QUERY_LIMIT};
