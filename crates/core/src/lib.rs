//! # Foreman Core
//!
//! Domain types, traits, and error definitions for the Foreman assistant
//! fleet. Every collaborator the assistants and the orchestrator talk to
//! (completion service, tools, shared store, pub/sub bus, notification
//! sender) is a trait here; implementations live in their own crates.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod event;
pub mod bus;
pub mod store;
pub mod notify;
pub mod fingerprint;

// Re-export key types at crate root for ergonomics
pub use error::{BusError, Error, NotifyError, ProviderError, Result, StoreError, ToolError};
pub use message::{ContentBlock, Conversation, ConversationId, Message, Role};
pub use provider::{CompletionRequest, CompletionResponse, Provider, StopReason, ToolDefinition, Usage};
pub use tool::{Tool, ToolRegistry};
pub use event::{AgentEvent, ApprovalUpdate, CrossAgentTrigger, DataSource, EscalationEvent, Severity, channels};
pub use bus::{BusMessage, MessageBus};
pub use store::SharedStore;
pub use notify::{Notification, NotificationMethod, NotificationPriority, Notifier, Receipt};
