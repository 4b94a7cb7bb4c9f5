//! Twilio SMS sender.
//!
//! Sends through the Messages resource of the Twilio REST API with HTTP
//! basic auth. Email is not supported by this sender.

use async_trait::async_trait;
use chrono::Utc;
use foreman_core::error::NotifyError;
use foreman_core::notify::{Notification, NotificationMethod, Notifier, Receipt, SMS_MAX_LEN, truncate_chars};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sending phone number in E.164 form
    pub from_number: String,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .finish()
    }
}

pub struct TwilioNotifier {
    config: TwilioConfig,
    base_url: String,
    client: reqwest::Client,
}

impl TwilioNotifier {
    pub fn new(config: TwilioConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            config,
            base_url: DEFAULT_BASE_URL.into(),
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.config.account_sid
        )
    }

    fn form_fields<'a>(&'a self, notification: &'a Notification) -> [(&'static str, &'a str); 3] {
        [
            ("To", notification.recipient.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Body", truncate_chars(&notification.message, SMS_MAX_LEN)),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl Notifier for TwilioNotifier {
    fn name(&self) -> &str {
        "twilio"
    }

    async fn send(&self, notification: &Notification) -> Result<Receipt, NotifyError> {
        if notification.method != NotificationMethod::Sms {
            return Err(NotifyError::Unsupported {
                sender: "twilio".into(),
                method: notification.method.to_string(),
            });
        }

        let delivery_failed = |reason: String| NotifyError::DeliveryFailed {
            recipient: notification.recipient.clone(),
            reason,
        };

        debug!(recipient = %notification.recipient, "Sending SMS via Twilio");

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&self.form_fields(notification))
            .send()
            .await
            .map_err(|e| delivery_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<TwilioErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), reason = %reason, "Twilio rejected SMS");
            return Err(delivery_failed(format!("HTTP {}: {reason}", status.as_u16())));
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| delivery_failed(format!("unreadable Twilio response: {e}")))?;

        Ok(Receipt {
            id: resource.sid,
            status: resource.status.unwrap_or_else(|| "queued".into()),
            sent_at: Utc::now(),
        })
    }
}
