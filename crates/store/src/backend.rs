//! Store backend capability interface
//!
//! [`StoreBackend`] is the narrow contract the engine consumes from an
//! underlying key-value store: string get/del, set membership reads,
//! sorted-set range/count reads, TTL inspection, and atomic execution of a
//! queued [`Pipeline`]. One concrete implementation exists per underlying
//! client library, selected explicitly at construction time; this crate
//! ships [`MemoryStore`](crate::memory::MemoryStore).
//!
//! ## Failure contract
//!
//! Read operations propagate transport errors directly. `exec` inspects
//! each command's individual result: under [`ErrorPolicy::Fatal`] (the
//! default) any per-command error fails the whole batch, surfaced as
//! `Error::BatchFailed`. The store provides best-effort atomicity only —
//! commands that ran before the failure are not rolled back, and callers
//! must not assume they were.

use crate::command::Pipeline;
use tagbase_core::{Order, Result, ScoreRange};

/// TTL result for a key that does not exist
pub const TTL_MISSING: i64 = -2;

/// TTL result for a key that exists without an expiration
pub const TTL_PERSISTENT: i64 = -1;

/// What a backend does when commands inside an executed batch fail
///
/// This is a construction-time knob, not a per-call option. `Fatal` aborts
/// the operation by returning the batch error to the caller;
/// `LogAndContinue` records each failure via `tracing::warn!` and reports
/// success. No automatic retry happens under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Surface batch failures to the caller (default)
    #[default]
    Fatal,
    /// Log batch failures and continue
    LogAndContinue,
}

/// Capability interface the engine requires from the underlying store
///
/// All operations use the store's standard semantics: `zrange` bounds are
/// inclusive rank indices with negative indices counting from the end,
/// `zcount` bounds are inclusive scores, and `ttl` follows the
/// [-2 missing / -1 persistent / n seconds](TTL_MISSING) convention.
pub trait StoreBackend: Send + Sync {
    /// Fetch the serialized value at a key, `None` if absent
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete keys, returning how many existed
    fn del(&self, keys: &[String]) -> Result<u64>;

    /// All members of a set; empty for a missing key
    fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// Members of a sorted set between two inclusive rank indices
    ///
    /// Negative indices count from the end (`-1` is the last member).
    /// Members are ordered by (score, member); `Order::Descending` reverses
    /// before the indices are applied, as the store does.
    fn zrange(&self, key: &str, start: i64, stop: i64, order: Order) -> Result<Vec<String>>;

    /// Count of sorted-set members with scores inside an inclusive range
    fn zcount(&self, key: &str, range: ScoreRange) -> Result<u64>;

    /// Remaining time to live of a key in seconds
    ///
    /// Returns [`TTL_MISSING`] for an absent key and [`TTL_PERSISTENT`]
    /// for a key with no expiration.
    fn ttl(&self, key: &str) -> Result<i64>;

    /// Execute a queued batch atomically
    ///
    /// The batch is applied without interleaving with other clients. Partial
    /// failure handling follows the backend's [`ErrorPolicy`].
    fn exec(&self, pipeline: Pipeline) -> Result<()>;
}
