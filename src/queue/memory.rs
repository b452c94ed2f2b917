//! In-process queue store
//!
//! Backs the same contract as the Redis store with plain hash maps behind a
//! mutex. Used by the test suite and by single-process runs that do not
//! have a Redis server available.

use crate::queue::{QueueResult, QueueStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    sets: HashMap<String, HashSet<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
}

/// Queue store held entirely in process memory
#[derive(Default)]
pub struct MemoryQueueStore {
    inner: Mutex<Inner>,
}

impl MemoryQueueStore {
    /// Creates a new, empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn set_add(&self, set: &str, member: &str) -> QueueResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_pop(&self, set: &str) -> QueueResult<Option<String>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(members) = inner.sets.get_mut(set) else {
            return Ok(None);
        };
        // HashSet iteration order stands in for Redis' random pop.
        let member = members.iter().next().cloned();
        if let Some(ref m) = member {
            members.remove(m);
        }
        Ok(member)
    }

    async fn set_contains(&self, set: &str, member: &str) -> QueueResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sets
            .get(set)
            .map(|s| s.contains(member))
            .unwrap_or(false))
    }

    async fn hash_get(&self, key: &str, field: &str) -> QueueResult<Option<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .hashes
            .get(key)
            .and_then(|h| h.get(field))
            .cloned())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> QueueResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }
}
