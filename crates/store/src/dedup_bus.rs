//! A bus wrapper that suppresses repeat publishes.
//!
//! A payload published on a channel claims `dedup:pubsub:<hash>` in the
//! shared store for the TTL; an identical payload on the same channel inside
//! that window is dropped silently.

use async_trait::async_trait;
use foreman_core::bus::{BusMessage, MessageBus};
use foreman_core::error::BusError;
use foreman_core::fingerprint;
use foreman_core::store::SharedStore;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;

pub struct DedupBus {
    inner: Arc<dyn MessageBus>,
    store: Arc<dyn SharedStore>,
    ttl: Duration,
}

impl DedupBus {
    pub fn new(inner: Arc<dyn MessageBus>, store: Arc<dyn SharedStore>, ttl: Duration) -> Self {
        Self { inner, store, ttl }
    }

    fn key(channel: &str, payload: &serde_json::Value) -> String {
        let digest = fingerprint::fingerprint(&serde_json::json!({
            "channel": channel,
            "payload": payload,
        }));
        format!("dedup:pubsub:{digest}")
    }
}

#[async_trait]
impl MessageBus for DedupBus {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), BusError> {
        let key = Self::key(channel, &payload);
        match self.store.set_if_absent(&key, "1", Some(self.ttl)).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(channel, "Dropping duplicate publish");
                return Ok(());
            }
            Err(e) => {
                // Deliver anyway; a duplicate is better than a lost message
                tracing::warn!(channel, error = %e, "Dedup store unavailable, publishing without dedup");
            }
        }
        self.inner.publish(channel, payload).await
    }

    async fn subscribe(&self, channel: &str) -> Result<BoxStream<'static, BusMessage>, BusError> {
        self.inner.subscribe(channel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryBus, InMemoryStore};

    fn dedup_bus() -> (Arc<InMemoryBus>, DedupBus) {
        let inner = Arc::new(InMemoryBus::new());
        let bus = DedupBus::new(
            inner.clone(),
            Arc::new(InMemoryStore::new()),
            Duration::from_secs(14_400),
        );
        (inner, bus)
    }

    #[tokio::test]
    async fn identical_payload_published_once() {
        let (inner, bus) = dedup_bus();
        let payload = serde_json::json!({"source": "compliance", "type": "critical_deviation"});
        bus.publish("channel:agent_events", payload.clone()).await.unwrap();
        bus.publish("channel:agent_events", payload).await.unwrap();
        assert_eq!(inner.history("channel:agent_events").await.len(), 1);
    }

    #[tokio::test]
    async fn key_order_does_not_defeat_dedup() {
        let (inner, bus) = dedup_bus();
        bus.publish("c", serde_json::json!({"a": 1, "b": 2})).await.unwrap();
        bus.publish("c", serde_json::json!({"b": 2, "a": 1})).await.unwrap();
        assert_eq!(inner.published_count().await, 1);
    }

    #[tokio::test]
    async fn same_payload_on_other_channel_is_distinct() {
        let (inner, bus) = dedup_bus();
        let payload = serde_json::json!({"n": 1});
        bus.publish("channel:a", payload.clone()).await.unwrap();
        bus.publish("channel:b", payload).await.unwrap();
        assert_eq!(inner.published_count().await, 2);
    }
}
