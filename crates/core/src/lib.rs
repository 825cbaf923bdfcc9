//! Core types for Tagbase
//!
//! This crate defines the foundational value types used throughout the system:
//! - Tag: hierarchical slash-delimited tag with implicit path-prefix ancestry
//! - KeySpace: pure key-derivation schema mapping entries and tags onto store keys
//! - Where/Order/ScoreRange: query expression types
//! - Entry: a stored value plus its identifier
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod keys;
pub mod query;
pub mod tag;

pub use error::{Error, Result};
pub use keys::KeySpace;
pub use query::{Entry, Order, ScoreBound, ScoreRange, Where};
pub use tag::{Tag, TAG_SEPARATOR};
