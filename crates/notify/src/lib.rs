//! Notification senders for Foreman.
//!
//! Available senders:
//! - **Log**: writes each notification as a tracing record (default)
//! - **Twilio**: SMS through the Twilio Messages API

pub mod log;
pub mod twilio;

pub use log::LogNotifier;
pub use twilio::{TwilioConfig, TwilioNotifier};

use foreman_config::{AppConfig, NotifierKind};
use foreman_core::error::NotifyError;
use foreman_core::notify::Notifier;
use std::sync::Arc;

/// Build the notification sender selected by configuration.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.notifier.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier::new())),
        NotifierKind::Twilio => {
            let n = &config.notifier;
            let field = |value: &Option<String>, name: &str| {
                value
                    .clone()
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| NotifyError::NotConfigured(format!("missing {name}")))
            };
            let twilio = TwilioConfig {
                account_sid: field(&n.twilio_account_sid, "twilio_account_sid")?,
                auth_token: field(&n.twilio_auth_token, "twilio_auth_token")?,
                from_number: field(&n.twilio_from_number, "twilio_from_number")?,
            };
            Ok(Arc::new(TwilioNotifier::new(twilio)))
        }
    }
}
