//! Agent events and the records the orchestrator derives from them.
//!
//! An [`AgentEvent`] is the structured result of one assistant run. It is
//! published on the bus and consumed by the orchestrator, which turns it into
//! zero or more [`CrossAgentTrigger`]s and, for the most serious events, an
//! [`EscalationEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Well-known bus channel names.
pub mod channels {
    pub const AGENT_EVENTS: &str = "channel:agent_events";
    pub const ESCALATION: &str = "channel:escalation";
    pub const APPROVAL_UPDATES: &str = "channel:approval_updates";
    pub const DASHBOARD_UPDATES: &str = "channel:dashboard_updates";
    pub const SAFETY_ALERTS: &str = "channel:safety_alerts";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Where a piece of evidence came from and how far to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// "api", "database", "document", "sensor", "manual"
    pub source_type: String,
    /// "weather_forecast", "risk_register", ...
    pub source_name: String,
    pub retrieved_at: DateTime<Utc>,
    pub confidence: f64,
}

impl DataSource {
    pub fn new(source_type: impl Into<String>, source_name: impl Into<String>, confidence: f64) -> Self {
        Self {
            source_type: source_type.into(),
            source_name: source_name.into(),
            retrieved_at: Utc::now(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// The structured output of one assistant run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub event_id: String,
    pub source_agent: String,
    pub event_type: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    pub confidence: f64,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub transparency_log: Vec<String>,
    #[serde(default)]
    pub requires_cross_agent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_agent: Option<String>,
}

impl AgentEvent {
    /// Create an event with a fresh id, the current time and full confidence.
    pub fn new(
        source_agent: impl Into<String>,
        event_type: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            source_agent: source_agent.into(),
            event_type: event_type.into(),
            severity,
            timestamp: Utc::now(),
            data: serde_json::Map::new(),
            confidence: 1.0,
            data_sources: Vec::new(),
            transparency_log: Vec::new(),
            requires_cross_agent: false,
            target_agent: None,
        }
    }

    /// Replace the payload. Non-object values are wrapped under `"value"`.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = match data {
            serde_json::Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".into(), other);
                map
            }
        };
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_sources(mut self, sources: Vec<DataSource>) -> Self {
        self.data_sources = sources;
        self
    }

    pub fn with_transparency_log(mut self, log: Vec<String>) -> Self {
        self.transparency_log = log;
        self
    }

    /// Ask the orchestrator to route this event, optionally to one agent.
    pub fn routed_to(mut self, target_agent: Option<String>) -> Self {
        self.requires_cross_agent = true;
        self.target_agent = target_agent;
        self
    }

    /// Numeric payload field; missing or non-numeric reads as 0.
    pub fn number(&self, field: &str) -> f64 {
        self.data.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0)
    }

    /// Boolean payload field; anything but `true` reads as false.
    pub fn flag(&self, field: &str) -> bool {
        self.data.get(field).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// String payload field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }
}

/// An orchestrator-produced instruction to another assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossAgentTrigger {
    pub source_agent: String,
    pub source_event_type: String,
    pub target_agent: String,
    pub target_action: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    /// 1 is most urgent.
    pub priority: u8,
}

/// Audit record of a human-paging action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationEvent {
    pub event_id: String,
    pub trigger_agent: String,
    pub trigger_type: String,
    pub severity: Severity,
    pub impact_dollars: f64,
    pub safety_critical: bool,
    pub message: String,
    pub sms_sent: bool,
    pub timestamp: DateTime<Utc>,
}

/// Published when a project manager signs off on a proposed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalUpdate {
    pub approval_id: String,
    pub approved: bool,
    pub notes: String,
    pub processed_at: DateTime<Utc>,
}
