//! Log-only notification sender.
//!
//! Nothing leaves the process: each notification becomes a tracing record,
//! `warn` for urgent and critical ones and `info` otherwise.

use async_trait::async_trait;
use chrono::Utc;
use foreman_core::error::NotifyError;
use foreman_core::notify::{Notification, NotificationPriority, Notifier, Receipt};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<Receipt, NotifyError> {
        let id = format!("log-{}", uuid::Uuid::new_v4());
        match notification.priority {
            NotificationPriority::Urgent | NotificationPriority::Critical => warn!(
                id = %id,
                method = %notification.method,
                recipient = %notification.recipient,
                priority = ?notification.priority,
                "NOTIFY: {}",
                notification.message
            ),
            NotificationPriority::Normal => info!(
                id = %id,
                method = %notification.method,
                recipient = %notification.recipient,
                "NOTIFY: {}",
                notification.message
            ),
        }
        Ok(Receipt {
            id,
            status: "logged".into(),
            sent_at: Utc::now(),
        })
    }
}
