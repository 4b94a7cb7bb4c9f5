//! In-process pub/sub bus backed by one `tokio::sync::broadcast` channel per
//! bus channel name.

use async_trait::async_trait;
use chrono::Utc;
use foreman_core::bus::{BusMessage, MessageBus};
use foreman_core::error::BusError;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

const DEFAULT_CAPACITY: usize = 256;
const DEFAULT_HISTORY_LIMIT: usize = 1024;

/// An in-process message bus.
///
/// Recent messages are also kept in a bounded history log so callers can
/// inspect what went out without subscribing first. The oldest entries are
/// dropped once the log is full.
pub struct InMemoryBus {
    capacity: usize,
    history_limit: usize,
    senders: RwLock<HashMap<String, broadcast::Sender<BusMessage>>>,
    history: Arc<RwLock<VecDeque<BusMessage>>>,
    published: AtomicUsize,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Per-channel buffer size; slow subscribers lag past this many messages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            history_limit: DEFAULT_HISTORY_LIMIT,
            senders: RwLock::new(HashMap::new()),
            history: Arc::new(RwLock::new(VecDeque::new())),
            published: AtomicUsize::new(0),
        }
    }

    /// Keep at most `limit` messages in the history log.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    async fn sender(&self, channel: &str) -> broadcast::Sender<BusMessage> {
        if let Some(tx) = self.senders.read().await.get(channel) {
            return tx.clone();
        }
        self.senders
            .write()
            .await
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Retained messages published on `channel`, oldest first.
    pub async fn history(&self, channel: &str) -> Vec<BusMessage> {
        self.history
            .read()
            .await
            .iter()
            .filter(|m| m.channel == channel)
            .cloned()
            .collect()
    }

    /// Total messages published on all channels, including ones no longer
    /// in the history log.
    pub async fn published_count(&self) -> usize {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), BusError> {
        let message = BusMessage {
            channel: channel.to_string(),
            payload,
            published_at: Utc::now(),
        };
        self.published.fetch_add(1, Ordering::Relaxed);
        if self.history_limit > 0 {
            let mut history = self.history.write().await;
            if history.len() >= self.history_limit {
                history.pop_front();
            }
            history.push_back(message.clone());
        }

        let tx = self.sender(channel).await;
        // No subscribers is fine: delivery is fire-and-forget
        let receivers = tx.send(message).unwrap_or(0);
        tracing::trace!(channel, receivers, "Published bus message");
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<BoxStream<'static, BusMessage>, BusError> {
        let rx = self.sender(channel).await.subscribe();
        let channel = channel.to_string();
        let stream = BroadcastStream::new(rx).filter_map(move |item| {
            let message = match item {
                Ok(message) => Some(message),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %channel, skipped, "Bus subscriber lagged, messages dropped");
                    None
                }
            };
            futures::future::ready(message)
        });
        Ok(stream.boxed())
    }
}
