//! A named assistant: one persona, one tool set, one running conversation.

use crate::loop_runner::{AgentLoop, ChatOutcome};
use crate::output::parse_structured_output;
use crate::publisher::EventPublisher;
use foreman_config::AppConfig;
use foreman_core::error::Result;
use foreman_core::event::{AgentEvent, Severity};
use foreman_core::message::Conversation;
use foreman_core::provider::Provider;
use foreman_core::tool::ToolRegistry;
use std::sync::Arc;
use tracing::debug;

/// Owns an [`AgentLoop`] and the conversation it drives.
///
/// Successive `chat` calls share context until [`reset`](Self::reset).
pub struct Assistant {
    name: String,
    agent: AgentLoop,
    conversation: Conversation,
}

impl Assistant {
    pub fn new(name: impl Into<String>, agent: AgentLoop) -> Self {
        Self {
            name: name.into(),
            agent,
            conversation: Conversation::new(),
        }
    }

    /// Build an assistant whose model, token budget, turn limit and deadline
    /// come from configuration.
    pub fn from_config(
        name: impl Into<String>,
        persona: impl Into<String>,
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let agent = AgentLoop::new(provider, config.model.clone(), tools)
            .with_system_prompt(persona)
            .with_max_tokens(config.max_tokens)
            .with_max_turns(config.agent.max_turns)
            .with_deadline(config.agent.deadline());
        Self::new(name, agent)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send a message and return the final answer text.
    pub async fn chat(&mut self, message: impl Into<String>) -> Result<String> {
        Ok(self.chat_with_log(message).await?.text)
    }

    /// Send a message and return the answer together with every tool call
    /// made along the way.
    pub async fn chat_with_log(&mut self, message: impl Into<String>) -> Result<ChatOutcome> {
        debug!(assistant = %self.name, "Chat");
        self.agent.run(&mut self.conversation, message).await
    }

    /// Run one message and publish the answer as an [`AgentEvent`].
    ///
    /// The answer is parsed with [`parse_structured_output`], so free text
    /// still goes out, under `raw_response`. A numeric `confidence` field in
    /// the answer becomes the event's confidence.
    pub async fn run_and_publish(
        &mut self,
        message: impl Into<String>,
        publisher: &EventPublisher,
        event_type: impl Into<String>,
        severity: Severity,
    ) -> Result<AgentEvent> {
        publisher.mark_running().await?;
        let text = self.chat(message).await?;
        let data = parse_structured_output(&text);

        let confidence = data.get("confidence").and_then(serde_json::Value::as_f64);
        let mut event = publisher
            .event(event_type, severity)
            .with_data(serde_json::Value::Object(data));
        if let Some(confidence) = confidence {
            event = event.with_confidence(confidence);
        }

        publisher.publish(&event).await?;
        debug!(assistant = %self.name, event_id = %event.event_id, "Run published");
        Ok(event)
    }

    /// Forget the conversation. Tools and persona are kept.
    pub fn reset(&mut self) {
        debug!(assistant = %self.name, messages = self.conversation.len(), "Conversation reset");
        self.conversation.clear();
    }

    pub fn tool_count(&self) -> usize {
        self.agent.tools().len()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}
