//! SharedStore trait: the key-value store shared by every assistant and
//! orchestrator instance.
//!
//! Only simple operations are assumed: get/set with optional TTL, an atomic
//! set-if-absent, score-sorted sets for ranked lists, and plain sets for
//! membership. There are no transactions.

use async_trait::async_trait;
use std::time::Duration;
use crate::error::StoreError;

#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Backend name (e.g., "in_memory", "none").
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one and refreshing its TTL.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Write only if the key is absent (or expired). Returns `true` when the
    /// write happened. Must be atomic with respect to concurrent callers.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError>;

    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Add or re-score a member of a sorted set.
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError>;

    /// Members of a sorted set, highest score first, at most `limit` of them.
    async fn zrevrange(&self, key: &str, limit: usize) -> Result<Vec<(String, f64)>, StoreError>;

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn srem(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError>;
}
