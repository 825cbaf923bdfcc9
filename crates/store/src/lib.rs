//! Store adapter layer for Tagbase
//!
//! This crate defines the narrow capability interface the engine requires
//! from an underlying sorted-set/string key-value store, and provides an
//! in-memory reference backend:
//!
//! - [`Command`]/[`Pipeline`]: batched-command descriptors with deferred,
//!   atomic execution
//! - [`StoreBackend`]: the read-side operations plus `exec`
//! - [`ErrorPolicy`]: what to do when commands inside a batch fail
//! - [`MemoryStore`]: hermetic reference implementation used by tests and
//!   embedded deployments
//!
//! Any store exposing these primitives with their standard semantics is
//! sufficient; the engine makes no other deployment assumptions.

pub mod backend;
pub mod command;
pub mod memory;

pub use backend::{ErrorPolicy, StoreBackend, TTL_MISSING, TTL_PERSISTENT};
pub use command::{Aggregate, Command, Pipeline};
pub use memory::MemoryStore;
