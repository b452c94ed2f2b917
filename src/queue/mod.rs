//! Durable queue and cache store abstraction
//!
//! The frontier tier sets and the site-identity cache both live in a
//! Redis-like key/set store shared by every worker process. This module
//! defines the narrow contract the pipeline consumes (set add/pop/member
//! and hash get/set) together with the Redis-backed implementation and an
//! in-process implementation used by tests and single-process runs.

mod memory;
mod redis;

pub use self::memory::MemoryQueueStore;
pub use self::redis::RedisQueueStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the queue/cache store
///
/// These indicate a broken dependency (connectivity, protocol), not bad
/// input, and are treated as fatal by the pipeline.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Result type for queue store operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Narrow contract over the durable set/hash store
///
/// Implementations must be safe for concurrent use from many worker tasks.
/// `set_pop` removes an arbitrary member atomically: two concurrent pops
/// never return the same member.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Adds a member to a named set. Returns true if the member was new.
    async fn set_add(&self, set: &str, member: &str) -> QueueResult<bool>;

    /// Removes and returns an arbitrary member of a named set, or None if
    /// the set is empty.
    async fn set_pop(&self, set: &str) -> QueueResult<Option<String>>;

    /// Returns whether a member is present in a named set.
    async fn set_contains(&self, set: &str, member: &str) -> QueueResult<bool>;

    /// Reads a field from a named hash.
    async fn hash_get(&self, key: &str, field: &str) -> QueueResult<Option<String>>;

    /// Writes a field into a named hash.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> QueueResult<()>;
}
