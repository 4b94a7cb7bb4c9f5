//! Send notification tool: lets an assistant page a human directly.
//!
//! SMS bodies are cut to 160 characters before sending. The tool answers
//! with a JSON receipt the model can quote back.

use async_trait::async_trait;
use chrono::Utc;
use foreman_core::error::ToolError;
use foreman_core::notify::{
    Notification, NotificationMethod, NotificationPriority, Notifier, SMS_MAX_LEN, truncate_chars,
};
use foreman_core::tool::Tool;
use serde::Deserialize;
use std::sync::Arc;

pub struct SendNotificationTool {
    notifier: Arc<dyn Notifier>,
}

impl SendNotificationTool {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    method: NotificationMethod,
    recipient: String,
    message: String,
    #[serde(default)]
    priority: NotificationPriority,
}

#[async_trait]
impl Tool for SendNotificationTool {
    fn name(&self) -> &str {
        "send_notification"
    }

    fn description(&self) -> &str {
        "Send SMS or email notifications for critical alerts and escalations."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "method": {
                    "type": "string",
                    "enum": ["sms", "email"],
                    "description": "Notification method"
                },
                "recipient": {
                    "type": "string",
                    "description": "Phone number for SMS or email address"
                },
                "message": {
                    "type": "string",
                    "description": "Notification message body"
                },
                "priority": {
                    "type": "string",
                    "enum": ["normal", "urgent", "critical"],
                    "description": "Priority level",
                    "default": "normal"
                }
            },
            "required": ["method", "recipient", "message"]
        })
    }

    async fn call(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let args: Args = serde_json::from_value(input)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let (body, truncated) = match args.method {
            NotificationMethod::Sms => {
                let body = truncate_chars(&args.message, SMS_MAX_LEN);
                (body.to_string(), body.len() < args.message.len())
            }
            NotificationMethod::Email => (args.message.clone(), false),
        };

        let notification = Notification {
            method: args.method,
            recipient: args.recipient,
            message: body,
            priority: args.priority,
        };

        let receipt = self
            .notifier
            .send(&notification)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "send_notification".into(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            method = %notification.method,
            recipient = %notification.recipient,
            receipt = %receipt.id,
            "Notification sent by assistant"
        );

        let response = serde_json::json!({
            "status": "sent",
            "id": receipt.id,
            "method": notification.method,
            "recipient": notification.recipient,
            "message_length": notification.message.chars().count(),
            "truncated": truncated,
            "priority": notification.priority,
            "timestamp": Utc::now().to_rfc3339(),
        });
        serde_json::to_string_pretty(&response).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "send_notification".into(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreman_core::error::NotifyError;
    use foreman_core::notify::Receipt;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, notification: &Notification) -> Result<Receipt, NotifyError> {
            if self.fail {
                return Err(NotifyError::DeliveryFailed {
                    recipient: notification.recipient.clone(),
                    reason: "carrier down".into(),
                });
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(Receipt {
                id: "SM1".into(),
                status: "queued".into(),
                sent_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn long_sms_is_truncated() {
        let notifier = Arc::new(RecordingNotifier::default());
        let tool = SendNotificationTool::new(notifier.clone());
        let out = tool
            .execute(serde_json::json!({
                "method": "sms",
                "recipient": "+15550001111",
                "message": "é".repeat(200),
                "priority": "critical"
            }))
            .await;

        let receipt: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(receipt["status"], "sent");
        assert_eq!(receipt["truncated"], true);
        assert_eq!(receipt["message_length"], 160);
        assert_eq!(receipt["priority"], "critical");

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent[0].message.chars().count(), 160);
        assert_eq!(sent[0].priority, NotificationPriority::Critical);
    }

    #[tokio::test]
    async fn email_is_sent_whole() {
        let notifier = Arc::new(RecordingNotifier::default());
        let tool = SendNotificationTool::new(notifier.clone());
        let out = tool
            .execute(serde_json::json!({
                "method": "email",
                "recipient": "pm@example.com",
                "message": "x".repeat(500)
            }))
            .await;
        let receipt: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(receipt["truncated"], false);
        assert_eq!(receipt["priority"], "normal");
        assert_eq!(notifier.sent.lock().unwrap()[0].message.len(), 500);
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let tool = SendNotificationTool::new(Arc::new(RecordingNotifier::default()));
        let out = tool
            .execute(serde_json::json!({"method": "fax", "recipient": "x", "message": "y"}))
            .await;
        assert!(out.starts_with("Error: Invalid tool arguments"));
    }

    #[tokio::test]
    async fn delivery_failure_becomes_error_text() {
        let tool = SendNotificationTool::new(Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        }));
        let out = tool
            .execute(serde_json::json!({"method": "sms", "recipient": "+1", "message": "hi"}))
            .await;
        assert!(out.starts_with("Error: "));
        assert!(out.contains("carrier down"));
    }
}
