//! Redis-backed queue store
//!
//! Uses a single multiplexed async connection shared by all workers; the
//! connection is cheap to clone and serializes commands internally.

use crate::queue::{QueueResult, QueueStore};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

/// Queue store backed by a Redis server
pub struct RedisQueueStore {
    conn: MultiplexedConnection,
}

impl RedisQueueStore {
    /// Connects to the Redis server at the given URL
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL, e.g. `redis://127.0.0.1/`
    pub async fn connect(url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl QueueStore for RedisQueueStore {
    async fn set_add(&self, set: &str, member: &str) -> QueueResult<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.sadd(set, member).await?;
        Ok(added > 0)
    }

    async fn set_pop(&self, set: &str) -> QueueResult<Option<String>> {
        let mut conn = self.conn.clone();
        let member: Option<String> = conn.spop(set).await?;
        Ok(member)
    }

    async fn set_contains(&self, set: &str, member: &str) -> QueueResult<bool> {
        let mut conn = self.conn.clone();
        let found: bool = conn.sismember(set, member).await?;
        Ok(found)
    }

    async fn hash_get(&self, key: &str, field: &str) -> QueueResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(key, field).await?;
        Ok(value)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }
}
