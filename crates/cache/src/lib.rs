//! Redis-backed token presence cache.
//!
//! Each issued token is stored as its own key with an empty value and a
//! millisecond expiry. Writes use `SET ... NX PX`, so re-saving a live token
//! leaves the original expiry untouched.

use std::time::Duration;

use async_trait::async_trait;
use chatline_core::store::{SessionCache, StoreError, StoreResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// [`SessionCache`] over a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisSessionCache {
    conn: ConnectionManager,
}

impl RedisSessionCache {
    /// Connect to the Redis instance at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(StoreError::cache)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(StoreError::cache)?;
        tracing::info!("Connected to Redis");
        Ok(Self { conn })
    }

    /// Round-trip a `PING`.
    pub async fn health_check(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(StoreError::cache)?;
        Ok(())
    }
}

/// Redis rejects `PX 0`; sub-millisecond lifetimes round up to one.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn save_token(&self, token: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        // Nil reply means the key already exists; that is not an error.
        let reply: Option<String> = redis::cmd("SET")
            .arg(token)
            .arg("")
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(StoreError::cache)?;
        if reply.is_none() {
            tracing::debug!("Token already cached, keeping existing expiry");
        }
        Ok(())
    }

    async fn check_token(&self, token: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(token).await.map_err(StoreError::cache)?;
        Ok(exists)
    }

    async fn revoke_token(&self, token: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(token).await.map_err(StoreError::cache)?;
        Ok(())
    }
}
