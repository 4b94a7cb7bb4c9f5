//! Configuration loading, validation, and management for Foreman.
//!
//! Loads configuration from `~/.foreman/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.foreman/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion service API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used by every assistant unless overridden
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Override for the completion service base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub escalation: EscalationConfig,

    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".into()
}
fn default_max_tokens() -> u32 {
    8192
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_url", &self.api_url)
            .field("agent", &self.agent)
            .field("escalation", &self.escalation)
            .field("thresholds", &self.thresholds)
            .field("notifier", &self.notifier)
            .field("store", &self.store)
            .finish()
    }
}

/// Agent loop bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Wall-clock budget for one chat call; absent or 0 means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

fn default_max_turns() -> u32 {
    25
}

impl AgentConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            deadline_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Dollar impact above which an event pages the project manager
    #[serde(default = "default_impact_threshold")]
    pub impact_threshold: f64,

    #[serde(default)]
    pub pm_phone_number: String,

    /// How long an escalation suppresses identical ones
    #[serde(default = "default_dedup_ttl_secs")]
    pub dedup_ttl_secs: u64,

    #[serde(default = "default_sms_max_len")]
    pub sms_max_len: usize,
}

fn default_impact_threshold() -> f64 {
    250_000.0
}
fn default_dedup_ttl_secs() -> u64 {
    14_400
}
fn default_sms_max_len() -> usize {
    160
}

impl EscalationConfig {
    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.dedup_ttl_secs)
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            impact_threshold: default_impact_threshold(),
            pm_phone_number: String::new(),
            dedup_ttl_secs: default_dedup_ttl_secs(),
            sms_max_len: default_sms_max_len(),
        }
    }
}

/// Decision thresholds shared by the orchestrator and the assistants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_budget_variance_pct")]
    pub budget_variance_pct: f64,

    #[serde(default = "default_risk_probability")]
    pub risk_probability: f64,

    #[serde(default = "default_risk_impact")]
    pub risk_impact: f64,

    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_budget_variance_pct() -> f64 {
    10.0
}
fn default_risk_probability() -> f64 {
    0.15
}
fn default_risk_impact() -> f64 {
    100_000.0
}
fn default_confidence() -> f64 {
    0.70
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            budget_variance_pct: default_budget_variance_pct(),
            risk_probability: default_risk_probability(),
            risk_impact: default_risk_impact(),
            confidence: default_confidence(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Write notifications to the log only
    #[default]
    Log,
    Twilio,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twilio_account_sid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twilio_auth_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twilio_from_number: Option<String>,
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("kind", &self.kind)
            .field("twilio_account_sid", &self.twilio_account_sid)
            .field("twilio_auth_token", &redact(&self.twilio_auth_token))
            .field("twilio_from_number", &self.twilio_from_number)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    /// No shared store: dedup is disabled and briefs use placeholders
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

impl AppConfig {
    /// Load configuration from the default path (~/.foreman/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `FOREMAN_API_KEY`, then `ANTHROPIC_API_KEY`
    /// - `FOREMAN_MODEL`
    /// - `FOREMAN_PM_PHONE`
    /// - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_FROM_NUMBER`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("FOREMAN_API_KEY").or_else(|| non_empty("ANTHROPIC_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty("FOREMAN_MODEL") {
            self.model = model;
        }
        if let Some(phone) = non_empty("FOREMAN_PM_PHONE") {
            self.escalation.pm_phone_number = phone;
        }
        if let Some(sid) = non_empty("TWILIO_ACCOUNT_SID") {
            self.notifier.twilio_account_sid = Some(sid);
        }
        if let Some(token) = non_empty("TWILIO_AUTH_TOKEN") {
            self.notifier.twilio_auth_token = Some(token);
        }
        if let Some(from) = non_empty("TWILIO_FROM_NUMBER") {
            self.notifier.twilio_from_number = Some(from);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".foreman")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }
        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError("agent.max_turns must be > 0".into()));
        }
        if self.escalation.sms_max_len == 0 {
            return Err(ConfigError::ValidationError(
                "escalation.sms_max_len must be > 0".into(),
            ));
        }

        let thresholds = [
            ("escalation.impact_threshold", self.escalation.impact_threshold),
            ("thresholds.budget_variance_pct", self.thresholds.budget_variance_pct),
            ("thresholds.risk_probability", self.thresholds.risk_probability),
            ("thresholds.risk_impact", self.thresholds.risk_impact),
            ("thresholds.confidence", self.thresholds.confidence),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }

        if self.notifier.kind == NotifierKind::Twilio {
            let missing = [
                ("twilio_account_sid", &self.notifier.twilio_account_sid),
                ("twilio_auth_token", &self.notifier.twilio_auth_token),
                ("twilio_from_number", &self.notifier.twilio_from_number),
            ]
            .into_iter()
            .find(|(_, v)| v.as_deref().is_none_or(str::is_empty));
            if let Some((name, _)) = missing {
                return Err(ConfigError::ValidationError(format!(
                    "notifier.kind = \"twilio\" requires notifier.{name}"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_url: None,
            agent: AgentConfig::default(),
            escalation: EscalationConfig::default(),
            thresholds: ThresholdConfig::default(),
            notifier: NotifierConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for foreman_core::Error {
    fn from(e: ConfigError) -> Self {
        foreman_core::Error::Config {
            message: e.to_string(),
        }
    }
}
