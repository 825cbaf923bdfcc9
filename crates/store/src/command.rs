//! Batched write commands
//!
//! Writes against the store go through a [`Pipeline`]: an ordered list of
//! [`Command`] descriptors accumulated without executing anything, then
//! submitted as one atomic batch via [`StoreBackend::exec`]. Each builder
//! method consumes and returns the pipeline, so a pipeline under
//! construction is a plain value with no hidden state.
//!
//! The store guarantees the batch is not interleaved with other clients'
//! commands, but does NOT guarantee all-or-nothing rollback on partial
//! failure.
//!
//! [`StoreBackend::exec`]: crate::backend::StoreBackend::exec

/// Score aggregation mode for union/intersection stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Sum of scores across sources
    Sum,
    /// Minimum score across sources
    Min,
    /// Maximum score across sources
    Max,
}

/// A single deferred store command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Store a serialized value, replacing any existing value (and clearing
    /// any expiration) at the key
    Set {
        /// Destination key
        key: String,
        /// Serialized value
        value: Vec<u8>,
    },
    /// Delete keys of any kind
    Del {
        /// Keys to delete
        keys: Vec<String>,
    },
    /// Set an expiration on an existing key
    Expire {
        /// Key to expire
        key: String,
        /// Time to live in seconds
        ttl_secs: u64,
    },
    /// Add members to a set
    SAdd {
        /// Set key
        key: String,
        /// Members to add
        members: Vec<String>,
    },
    /// Add scored members to a sorted set (idempotent per member, last
    /// score wins)
    ZAdd {
        /// Sorted-set key
        key: String,
        /// (score, member) pairs
        entries: Vec<(f64, String)>,
    },
    /// Remove members from a sorted set
    ZRem {
        /// Sorted-set key
        key: String,
        /// Members to remove
        members: Vec<String>,
    },
    /// Store the union of source sorted sets at a destination key
    ZUnionStore {
        /// Destination key (overwritten)
        destination: String,
        /// Source sorted-set keys; missing sources are treated as empty
        sources: Vec<String>,
        /// Score aggregation across sources
        aggregate: Aggregate,
    },
    /// Store the intersection of source sorted sets at a destination key
    ZInterStore {
        /// Destination key (overwritten)
        destination: String,
        /// Source sorted-set keys
        sources: Vec<String>,
        /// Score aggregation across sources
        aggregate: Aggregate,
    },
}

/// An ordered batch of deferred commands
///
/// Built fluently; executed once via the backend. Empty pipelines execute
/// as a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    commands: Vec<Command>,
}

impl Pipeline {
    /// Start an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `Set`
    pub fn set(mut self, key: impl Into<String>, value: Vec<u8>) -> Self {
        self.commands.push(Command::Set {
            key: key.into(),
            value,
        });
        self
    }

    /// Queue a `Del`
    pub fn del(mut self, keys: Vec<String>) -> Self {
        self.commands.push(Command::Del { keys });
        self
    }

    /// Queue an `Expire`
    pub fn expire(mut self, key: impl Into<String>, ttl_secs: u64) -> Self {
        self.commands.push(Command::Expire {
            key: key.into(),
            ttl_secs,
        });
        self
    }

    /// Queue an `SAdd`
    pub fn sadd(mut self, key: impl Into<String>, members: Vec<String>) -> Self {
        self.commands.push(Command::SAdd {
            key: key.into(),
            members,
        });
        self
    }

    /// Queue a `ZAdd`
    pub fn zadd(mut self, key: impl Into<String>, entries: Vec<(f64, String)>) -> Self {
        self.commands.push(Command::ZAdd {
            key: key.into(),
            entries,
        });
        self
    }

    /// Queue a `ZRem`
    pub fn zrem(mut self, key: impl Into<String>, members: Vec<String>) -> Self {
        self.commands.push(Command::ZRem {
            key: key.into(),
            members,
        });
        self
    }

    /// Queue a `ZUnionStore`
    pub fn zunionstore(
        mut self,
        destination: impl Into<String>,
        sources: Vec<String>,
        aggregate: Aggregate,
    ) -> Self {
        self.commands.push(Command::ZUnionStore {
            destination: destination.into(),
            sources,
            aggregate,
        });
        self
    }

    /// Queue a `ZInterStore`
    pub fn zinterstore(
        mut self,
        destination: impl Into<String>,
        sources: Vec<String>,
        aggregate: Aggregate,
    ) -> Self {
        self.commands.push(Command::ZInterStore {
            destination: destination.into(),
            sources,
            aggregate,
        });
        self
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands have been queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queued commands, in submission order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Consume the pipeline, yielding its commands
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}
