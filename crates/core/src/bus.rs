//! Publish/subscribe bus: fire-and-forget messaging over named channels.
//!
//! Delivery is at-most-once: subscribers that fall behind or are not yet
//! subscribed simply miss messages. The orchestrator's dedup layer exists
//! because duplicate and lost deliveries are tolerated here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use crate::error::BusError;

/// A message delivered to a subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub channel: String,
    pub payload: serde_json::Value,
    pub published_at: DateTime<Utc>,
}

/// The core MessageBus trait.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Publish a payload on a channel. Publishing with no subscribers is not
    /// an error.
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), BusError>;

    /// Subscribe to a channel. The stream ends when the bus is dropped.
    async fn subscribe(&self, channel: &str) -> Result<BoxStream<'static, BusMessage>, BusError>;
}

/// Serialize `value` and publish it.
pub async fn publish_json<T: Serialize + ?Sized>(
    bus: &dyn MessageBus,
    channel: &str,
    value: &T,
) -> Result<(), BusError> {
    let payload = serde_json::to_value(value).map_err(|e| BusError::PublishFailed {
        channel: channel.to_string(),
        reason: e.to_string(),
    })?;
    bus.publish(channel, payload).await
}
