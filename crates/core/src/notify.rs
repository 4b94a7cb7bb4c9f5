//! Notifier trait: out-of-band human notification (SMS or email).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::NotifyError;

/// Carrier limit for a single SMS body.
pub const SMS_MAX_LEN: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMethod {
    Sms,
    Email,
}

impl std::fmt::Display for NotificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationMethod::Sms => f.write_str("sms"),
            NotificationMethod::Email => f.write_str("email"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    #[default]
    Normal,
    Urgent,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub method: NotificationMethod,
    /// Phone number for SMS, address for email
    pub recipient: String,
    pub message: String,
    #[serde(default)]
    pub priority: NotificationPriority,
}

impl Notification {
    pub fn sms(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            method: NotificationMethod::Sms,
            recipient: recipient.into(),
            message: message.into(),
            priority: NotificationPriority::Normal,
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Proof of hand-off to the delivery service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Provider-side message id (e.g., a Twilio SID)
    pub id: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, notification: &Notification) -> Result<Receipt, NotifyError>;
}

/// Cut `text` to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
