//! In-memory reference backend
//!
//! [`MemoryStore`] implements [`StoreBackend`] entirely in process. It exists
//! so the engine and its tests run hermetically, and doubles as an embedded
//! backend for callers that do not need an external store.
//!
//! ## Atomicity
//!
//! The whole key space lives behind one `parking_lot::RwLock`; `exec` applies
//! an entire batch under a single write guard, which gives the
//! no-interleaving guarantee of the batch contract. Rollback is still not
//! provided: commands preceding a failed command stay applied, matching the
//! external-store contract.
//!
//! ## Expiration
//!
//! Expiry is lazy: expired slots are treated as missing on access and
//! overwritten on write. Time is measured against a logical clock that tests
//! can move forward with [`MemoryStore::advance_clock`], so TTL behavior is
//! testable without sleeping.

use crate::backend::{ErrorPolicy, StoreBackend, TTL_MISSING, TTL_PERSISTENT};
use crate::command::{Aggregate, Command, Pipeline};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tagbase_core::{Error, Order, Result, ScoreRange};
use tracing::warn;

/// One stored value: a blob, a set, or a sorted set
#[derive(Debug, Clone)]
enum SlotValue {
    Blob(Vec<u8>),
    Set(FxHashSet<String>),
    /// member → score; range reads order by (score, member)
    SortedSet(BTreeMap<String, f64>),
}

impl SlotValue {
    fn kind(&self) -> &'static str {
        match self {
            SlotValue::Blob(_) => "string",
            SlotValue::Set(_) => "set",
            SlotValue::SortedSet(_) => "zset",
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: SlotValue,
    /// Logical deadline, measured against the store's clock
    expires_at: Option<Duration>,
}

impl Slot {
    fn live(value: SlotValue) -> Self {
        Slot {
            value,
            expires_at: None,
        }
    }

    fn is_live(&self, now: Duration) -> bool {
        self.expires_at.map_or(true, |deadline| deadline > now)
    }
}

/// Hermetic in-memory implementation of [`StoreBackend`]
///
/// Safe to share across threads. Construction picks the [`ErrorPolicy`];
/// [`MemoryStore::new`] defaults to [`ErrorPolicy::Fatal`].
#[derive(Debug)]
pub struct MemoryStore {
    slots: RwLock<FxHashMap<String, Slot>>,
    policy: ErrorPolicy,
    epoch: Instant,
    /// Milliseconds added on top of real elapsed time (test clock control)
    clock_skew_ms: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store with the default fatal error policy
    pub fn new() -> Self {
        Self::with_policy(ErrorPolicy::Fatal)
    }

    /// Create a store with an explicit error policy
    pub fn with_policy(policy: ErrorPolicy) -> Self {
        MemoryStore {
            slots: RwLock::new(FxHashMap::default()),
            policy,
            epoch: Instant::now(),
            clock_skew_ms: AtomicU64::new(0),
        }
    }

    /// Move the store's logical clock forward
    ///
    /// Expirations are evaluated against the logical clock, so tests can
    /// make TTLs elapse without sleeping.
    pub fn advance_clock(&self, delta: Duration) {
        self.clock_skew_ms
            .fetch_add(delta.as_millis() as u64, Ordering::SeqCst);
    }

    fn now(&self) -> Duration {
        self.epoch.elapsed() + Duration::from_millis(self.clock_skew_ms.load(Ordering::SeqCst))
    }

    /// Number of live keys (for tests and diagnostics)
    pub fn key_count(&self) -> usize {
        let now = self.now();
        self.slots
            .read()
            .values()
            .filter(|slot| slot.is_live(now))
            .count()
    }
}

fn wrong_type(key: &str, found: &SlotValue) -> Error {
    Error::Store(format!(
        "WRONGTYPE: key {key:?} holds a {} value",
        found.kind()
    ))
}

/// Members of a sorted set ordered by (score, member)
fn ordered_members(set: &BTreeMap<String, f64>) -> Vec<(String, f64)> {
    let mut items: Vec<(String, f64)> = set.iter().map(|(m, s)| (m.clone(), *s)).collect();
    items.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    items
}

/// Resolve inclusive, possibly-negative range indices against a length
fn resolve_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    if len == 0 {
        return None;
    }
    let resolve = |i: i64| if i < 0 { len + i } else { i };
    let start = resolve(start).max(0);
    let stop = resolve(stop).min(len - 1);
    if start > stop {
        return None;
    }
    Some((start as usize, stop as usize))
}

impl StoreBackend for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.now();
        let slots = self.slots.read();
        match slots.get(key) {
            Some(slot) if slot.is_live(now) => match &slot.value {
                SlotValue::Blob(bytes) => Ok(Some(bytes.clone())),
                other => Err(wrong_type(key, other)),
            },
            _ => Ok(None),
        }
    }

    fn del(&self, keys: &[String]) -> Result<u64> {
        let now = self.now();
        let mut slots = self.slots.write();
        let mut removed = 0;
        for key in keys {
            if let Some(slot) = slots.remove(key) {
                if slot.is_live(now) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let now = self.now();
        let slots = self.slots.read();
        match slots.get(key) {
            Some(slot) if slot.is_live(now) => match &slot.value {
                SlotValue::Set(members) => {
                    let mut out: Vec<String> = members.iter().cloned().collect();
                    out.sort();
                    Ok(out)
                }
                other => Err(wrong_type(key, other)),
            },
            _ => Ok(Vec::new()),
        }
    }

    fn zrange(&self, key: &str, start: i64, stop: i64, order: Order) -> Result<Vec<String>> {
        let now = self.now();
        let slots = self.slots.read();
        let set = match slots.get(key) {
            Some(slot) if slot.is_live(now) => match &slot.value {
                SlotValue::SortedSet(set) => set,
                other => return Err(wrong_type(key, other)),
            },
            _ => return Ok(Vec::new()),
        };

        let mut items = ordered_members(set);
        if order == Order::Descending {
            items.reverse();
        }
        let Some((start, stop)) = resolve_range(start, stop, items.len()) else {
            return Ok(Vec::new());
        };
        Ok(items[start..=stop]
            .iter()
            .map(|(member, _)| member.clone())
            .collect())
    }

    fn zcount(&self, key: &str, range: ScoreRange) -> Result<u64> {
        let now = self.now();
        let slots = self.slots.read();
        match slots.get(key) {
            Some(slot) if slot.is_live(now) => match &slot.value {
                SlotValue::SortedSet(set) => {
                    Ok(set.values().filter(|score| range.contains(**score)).count() as u64)
                }
                other => Err(wrong_type(key, other)),
            },
            _ => Ok(0),
        }
    }

    fn ttl(&self, key: &str) -> Result<i64> {
        let now = self.now();
        let slots = self.slots.read();
        match slots.get(key) {
            Some(slot) if slot.is_live(now) => match slot.expires_at {
                Some(deadline) => {
                    let remaining = deadline.saturating_sub(now);
                    Ok(remaining.as_secs_f64().ceil() as i64)
                }
                None => Ok(TTL_PERSISTENT),
            },
            _ => Ok(TTL_MISSING),
        }
    }

    fn exec(&self, pipeline: Pipeline) -> Result<()> {
        let commands = pipeline.into_commands();
        if commands.is_empty() {
            return Ok(());
        }
        let total = commands.len();
        let now = self.now();
        let mut slots = self.slots.write();

        let mut failed = 0usize;
        for (index, command) in commands.into_iter().enumerate() {
            if let Err(err) = apply_command(&mut slots, now, command) {
                failed += 1;
                match self.policy {
                    ErrorPolicy::Fatal => {}
                    ErrorPolicy::LogAndContinue => {
                        warn!(command = index, error = %err, "pipeline command failed");
                    }
                }
            }
        }

        if failed > 0 && self.policy == ErrorPolicy::Fatal {
            return Err(Error::BatchFailed { failed, total });
        }
        Ok(())
    }
}

fn apply_command(
    slots: &mut FxHashMap<String, Slot>,
    now: Duration,
    command: Command,
) -> std::result::Result<(), String> {
    match command {
        Command::Set { key, value } => {
            // SET replaces the value and clears any expiration
            slots.insert(key, Slot::live(SlotValue::Blob(value)));
            Ok(())
        }
        Command::Del { keys } => {
            for key in keys {
                slots.remove(&key);
            }
            Ok(())
        }
        Command::Expire { key, ttl_secs } => {
            // Expire on a missing key is a no-op, as in the store
            if let Some(slot) = slots.get_mut(&key) {
                if slot.is_live(now) {
                    slot.expires_at = Some(now + Duration::from_secs(ttl_secs));
                }
            }
            Ok(())
        }
        Command::SAdd { key, members } => {
            let slot = live_slot_entry(slots, key.clone(), now, || {
                SlotValue::Set(FxHashSet::default())
            });
            match &mut slot.value {
                SlotValue::Set(set) => {
                    set.extend(members);
                    Ok(())
                }
                other => Err(wrong_type(&key, other).to_string()),
            }
        }
        Command::ZAdd { key, entries } => {
            let slot = live_slot_entry(slots, key.clone(), now, || {
                SlotValue::SortedSet(BTreeMap::new())
            });
            match &mut slot.value {
                SlotValue::SortedSet(set) => {
                    // Idempotent per member, last score wins
                    for (score, member) in entries {
                        set.insert(member, score);
                    }
                    Ok(())
                }
                other => Err(wrong_type(&key, other).to_string()),
            }
        }
        Command::ZRem { key, members } => {
            if let Some(slot) = slots.get_mut(&key) {
                if slot.is_live(now) {
                    if let SlotValue::SortedSet(set) = &mut slot.value {
                        for member in &members {
                            set.remove(member);
                        }
                    } else {
                        return Err(wrong_type(&key, &slot.value).to_string());
                    }
                }
            }
            Ok(())
        }
        Command::ZUnionStore {
            destination,
            sources,
            aggregate,
        } => store_combined(slots, now, destination, &sources, aggregate, false),
        Command::ZInterStore {
            destination,
            sources,
            aggregate,
        } => store_combined(slots, now, destination, &sources, aggregate, true),
    }
}

/// Fetch a live slot for writing, replacing an expired or missing one
fn live_slot_entry<'a>(
    slots: &'a mut FxHashMap<String, Slot>,
    key: String,
    now: Duration,
    empty: impl Fn() -> SlotValue,
) -> &'a mut Slot {
    let slot = slots
        .entry(key)
        .or_insert_with(|| Slot::live(empty()));
    if !slot.is_live(now) {
        *slot = Slot::live(empty());
    }
    slot
}

fn store_combined(
    slots: &mut FxHashMap<String, Slot>,
    now: Duration,
    destination: String,
    sources: &[String],
    aggregate: Aggregate,
    intersect: bool,
) -> std::result::Result<(), String> {
    let mut source_sets: Vec<BTreeMap<String, f64>> = Vec::with_capacity(sources.len());
    for key in sources {
        match slots.get(key) {
            Some(slot) if slot.is_live(now) => match &slot.value {
                SlotValue::SortedSet(set) => source_sets.push(set.clone()),
                other => return Err(wrong_type(key, other).to_string()),
            },
            // Missing sources combine as empty sets
            _ => source_sets.push(BTreeMap::new()),
        }
    }

    let mut combined: BTreeMap<String, f64> = BTreeMap::new();
    for set in &source_sets {
        for (member, score) in set {
            combined
                .entry(member.clone())
                .and_modify(|existing| {
                    *existing = match aggregate {
                        Aggregate::Sum => *existing + score,
                        Aggregate::Min => existing.min(*score),
                        Aggregate::Max => existing.max(*score),
                    }
                })
                .or_insert(*score);
        }
    }
    if intersect {
        combined.retain(|member, _| source_sets.iter().all(|set| set.contains_key(member)));
    }

    // The store removes the destination when the result is empty
    if combined.is_empty() {
        slots.remove(&destination);
    } else {
        slots.insert(destination, Slot::live(SlotValue::SortedSet(combined)));
    }
    Ok(())
}
