//! In-memory shared store for tests and single-process fleets.
//!
//! Values expire lazily: an expired key is treated as absent on the next
//! access and removed then. Keys that are never read again are swept every
//! [`SWEEP_EVERY`] writes. Expiry uses `tokio::time::Instant`, so paused-clock
//! tests can advance past a TTL without sleeping.

use async_trait::async_trait;
use foreman_core::error::StoreError;
use foreman_core::store::SharedStore;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Writes between full sweeps of expired keys.
pub const SWEEP_EVERY: u64 = 256;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    SortedSet(HashMap<String, f64>),
    Set(BTreeSet<String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::SortedSet(_) => "sorted set",
            Value::Set(_) => "set",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

fn wrong_type(key: &str, expected: &str, found: &Value) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        reason: format!("expected {expected}, found {}", found.kind()),
    }
}

/// A shared store kept in a `HashMap` behind a tokio `RwLock`.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    writes: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove every expired key now. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let removed = sweep(&mut *self.entries.write().await);
        if removed > 0 {
            tracing::debug!(removed, "Purged expired keys");
        }
        removed
    }

    /// Count a write and sweep when the interval comes round.
    fn note_write(&self, map: &mut HashMap<String, Entry>) {
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            let removed = sweep(map);
            tracing::trace!(removed, "Swept expired keys");
        }
    }
}

fn sweep(map: &mut HashMap<String, Entry>) -> usize {
    let now = Instant::now();
    let before = map.len();
    map.retain(|_, e| e.is_live(now));
    before - map.len()
}

/// Drop `key` if it has expired, then return the live entry.
fn live_entry<'a>(map: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    let now = Instant::now();
    if map.get(key).is_some_and(|e| !e.is_live(now)) {
        map.remove(key);
    }
    map.get_mut(key)
}

#[async_trait]
impl SharedStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        match entries.get(key).filter(|e| e.is_live(now)) {
            None => Ok(None),
            Some(Entry { value: Value::Str(s), .. }) => Ok(Some(s.clone())),
            Some(Entry { value, .. }) => Err(wrong_type(key, "string", value)),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        self.note_write(&mut entries);
        entries.insert(key.to_string(), Entry::new(Value::Str(value.to_string()), ttl));
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        self.note_write(&mut entries);
        if live_entry(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(Value::Str(value.to_string()), ttl));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|e| e.is_live(now)))
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        self.note_write(&mut entries);
        match live_entry(&mut entries, key) {
            Some(Entry { value: Value::SortedSet(members), .. }) => {
                members.insert(member.to_string(), score);
            }
            Some(Entry { value, .. }) => return Err(wrong_type(key, "sorted set", value)),
            None => {
                let members = HashMap::from([(member.to_string(), score)]);
                entries.insert(key.to_string(), Entry::new(Value::SortedSet(members), None));
            }
        }
        Ok(())
    }

    async fn zrevrange(&self, key: &str, limit: usize) -> Result<Vec<(String, f64)>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let members = match entries.get(key).filter(|e| e.is_live(now)) {
            None => return Ok(Vec::new()),
            Some(Entry { value: Value::SortedSet(members), .. }) => members,
            Some(Entry { value, .. }) => return Err(wrong_type(key, "sorted set", value)),
        };

        let mut ranked: Vec<(String, f64)> =
            members.iter().map(|(m, s)| (m.clone(), *s)).collect();
        // Highest score first; ties broken by member for a stable order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        self.note_write(&mut entries);
        match live_entry(&mut entries, key) {
            Some(Entry { value: Value::Set(members), .. }) => Ok(members.insert(member.to_string())),
            Some(Entry { value, .. }) => Err(wrong_type(key, "set", value)),
            None => {
                let members = BTreeSet::from([member.to_string()]);
                entries.insert(key.to_string(), Entry::new(Value::Set(members), None));
                Ok(true)
            }
        }
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        match live_entry(&mut entries, key) {
            Some(Entry { value: Value::Set(members), .. }) => Ok(members.remove(member)),
            Some(Entry { value, .. }) => Err(wrong_type(key, "set", value)),
            None => Ok(false),
        }
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        match entries.get(key).filter(|e| e.is_live(now)) {
            None => Ok(Vec::new()),
            Some(Entry { value: Value::Set(members), .. }) => Ok(members.iter().cloned().collect()),
            Some(Entry { value, .. }) => Err(wrong_type(key, "set", value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_and_get() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("agent:risk_forecaster:status").await.unwrap(), None);
        store.set("agent:risk_forecaster:status", "running", None).await.unwrap();
        store.set("agent:risk_forecaster:status", "completed", None).await.unwrap();
        assert_eq!(
            store.get("agent:risk_forecaster:status").await.unwrap().as_deref(),
            Some("completed")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expires_keys() {
        let store = InMemoryStore::new();
        store.set("dedup:abc", "1", Some(Duration::from_secs(60))).await.unwrap();
        assert!(store.get("dedup:abc").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(store.get("dedup:abc").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn set_if_absent_claims_once_per_ttl() {
        let store = InMemoryStore::new();
        let ttl = Some(Duration::from_secs(14_400));
        assert!(store.set_if_absent("dedup:k", "1", ttl).await.unwrap());
        assert!(!store.set_if_absent("dedup:k", "1", ttl).await.unwrap());

        tokio::time::advance(Duration::from_secs(14_401)).await;
        assert!(store.set_if_absent("dedup:k", "1", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let store = InMemoryStore::new();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.set_if_absent("dedup:race", "1", None).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = InMemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn sorted_set_ranks_highest_first() {
        let store = InMemoryStore::new();
        let key = "project:p1:active_risks";
        store.zadd(key, "R-1", 0.4).await.unwrap();
        store.zadd(key, "R-2", 0.9).await.unwrap();
        store.zadd(key, "R-3", 0.6).await.unwrap();
        store.zadd(key, "R-1", 0.95).await.unwrap();

        let top = store.zrevrange(key, 2).await.unwrap();
        assert_eq!(top, vec![("R-1".to_string(), 0.95), ("R-2".to_string(), 0.9)]);
        assert!(store.zrevrange("project:none:active_risks", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn plain_sets_track_membership() {
        let store = InMemoryStore::new();
        let key = "project:p1:pending_approvals";
        assert!(store.sadd(key, "A-1").await.unwrap());
        assert!(!store.sadd(key, "A-1").await.unwrap());
        store.sadd(key, "A-2").await.unwrap();
        assert_eq!(store.smembers(key).await.unwrap(), vec!["A-1", "A-2"]);

        assert!(store.srem(key, "A-1").await.unwrap());
        assert!(!store.srem(key, "A-1").await.unwrap());
        assert_eq!(store.smembers(key).await.unwrap(), vec!["A-2"]);
    }

    #[tokio::test]
    async fn type_mismatch_is_an_error() {
        let store = InMemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        let err = store.zadd("k", "m", 1.0).await.unwrap_err();
        assert!(matches!(err, StoreError::WrongType { .. }));
        assert!(store.smembers("k").await.is_err());

        store.sadd("s", "m").await.unwrap();
        assert!(store.get("s").await.is_err());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let a = InMemoryStore::new();
        let b = a.clone();
        a.set("shared", "yes", None).await.unwrap();
        assert_eq!(b.get("shared").await.unwrap().as_deref(), Some("yes"));
        assert_eq!(b.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_keys_that_are_never_read_are_swept() {
        let store = InMemoryStore::new();
        let ttl = Some(Duration::from_secs(1));
        for n in 0..1_000 {
            store.set_if_absent(&format!("dedup:{n}"), "1", ttl).await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(3_600)).await;

        for _ in 0..SWEEP_EVERY {
            store.set("agent:financial:status", "completed", None).await.unwrap();
        }
        assert_eq!(store.entries.read().await.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_keeps_live_keys() {
        let store = InMemoryStore::new();
        store.set("dedup:old", "1", Some(Duration::from_secs(5))).await.unwrap();
        store.set("dedup:new", "1", Some(Duration::from_secs(60))).await.unwrap();
        store.sadd("project:p1:pending_approvals", "A-1").await.unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.entries.read().await.len(), 2);
        assert!(store.get("dedup:new").await.unwrap().is_some());
    }
}
