//! Error types for the Foreman domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context (completion service, tools, shared store, bus,
//! notifications) has its own error enum; [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all Foreman operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion service ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tools ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Shared store ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Pub/sub bus ---
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    // --- Notification sender ---
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    // --- Agent loop bounds ---
    #[error("Agent loop exceeded {limit} model turns without a final answer")]
    TurnLimitExceeded { limit: u32 },

    #[error("Agent loop deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Transport-level failures from the completion service.
///
/// These are fatal for the `chat` call in progress; retrying is the
/// invoker's job.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures inside a tool. Never escapes the tool boundary: see
/// [`Tool::execute`](crate::tool::Tool::execute).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} - {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Shared store unavailable: {0}")]
    Unavailable(String),

    #[error("Wrong value type at key {key}: {reason}")]
    WrongType { key: String, reason: String },

    #[error("Stored value at {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum BusError {
    #[error("Bus unavailable: {0}")]
    Unavailable(String),

    #[error("Publish to {channel} failed: {reason}")]
    PublishFailed { channel: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    #[error("Notification method not supported by {sender}: {method}")]
    Unsupported { sender: String, method: String },

    #[error("Delivery to {recipient} failed: {reason}")]
    DeliveryFailed { recipient: String, reason: String },
}
