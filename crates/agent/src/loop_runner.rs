//! The agent tool-use loop implementation.

use foreman_core::error::{Error, Result};
use foreman_core::message::{self, ContentBlock, Conversation, Message, Role};
use foreman_core::provider::{CompletionRequest, Provider};
use foreman_core::tool::ToolRegistry;
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_MAX_TURNS: u32 = 25;
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// One tool invocation made while answering a message.
#[derive(Debug, Clone, Serialize)]
pub struct ToolLogEntry {
    pub tool: String,
    pub input: serde_json::Value,
    pub result: String,
    pub is_error: bool,
}

/// The result of one [`AgentLoop::run`] call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    /// First text block of the final model turn, or empty.
    pub text: String,
    pub tool_log: Vec<ToolLogEntry>,
    /// Completion calls made.
    pub turns: u32,
}

/// Drives a conversation between a model and a tool registry.
///
/// The loop holds no conversation state; callers thread the conversation
/// through [`run`](Self::run).
pub struct AgentLoop {
    /// The completion service to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Max tokens per response
    max_tokens: u32,

    /// Persona prompt, sent out-of-band with every request
    system_prompt: Option<String>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Maximum completion calls per `run`
    max_turns: u32,

    /// Wall-clock budget per `run`
    deadline: Option<Duration>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
            tools,
            max_turns: DEFAULT_MAX_TURNS,
            deadline: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set the maximum number of completion calls per `run`.
    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns = max;
        self
    }

    /// Bound each `run` by wall-clock time.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Append `message` as a user turn and drive the model until it answers
    /// without requesting tools.
    ///
    /// Tool failures are reported back to the model and never abort the run.
    /// A completion-service failure is returned as-is; the conversation keeps
    /// every turn appended before the failure. When the deadline expires while
    /// tools are running, each pending call is answered with an error result
    /// so the conversation stays valid for the next run.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        message: impl Into<String>,
    ) -> Result<ChatOutcome> {
        let started = Instant::now();
        conversation.push(Message::user(message));

        info!(
            conversation_id = %conversation.id,
            messages = conversation.len(),
            tools = self.tools.len(),
            "Running agent loop"
        );

        let definitions = self.tools.definitions();
        let mut tool_log = Vec::new();
        let mut turns = 0;

        loop {
            if turns >= self.max_turns {
                warn!(
                    conversation_id = %conversation.id,
                    limit = self.max_turns,
                    "Turn limit reached without a final answer"
                );
                return Err(Error::TurnLimitExceeded { limit: self.max_turns });
            }
            turns += 1;

            let request = CompletionRequest {
                model: self.model.clone(),
                max_tokens: self.max_tokens,
                system: self.system_prompt.clone(),
                messages: conversation.messages.clone(),
                tools: definitions.clone(),
            };

            debug!(conversation_id = %conversation.id, turn = turns, "Awaiting model");
            let response = self.bounded(started, self.provider.complete(request)).await??;

            let calls: Vec<(String, String, serde_json::Value)> = message::tool_uses(&response.content)
                .map(|u| (u.id.to_string(), u.name.to_string(), u.input.clone()))
                .collect();
            conversation.push(Message::with_blocks(Role::Assistant, response.content));

            if calls.is_empty() {
                let text = conversation
                    .last()
                    .and_then(Message::first_text)
                    .unwrap_or_default()
                    .to_string();
                info!(
                    conversation_id = %conversation.id,
                    turns,
                    tool_calls = tool_log.len(),
                    "Agent loop finished"
                );
                return Ok(ChatOutcome { text, tool_log, turns });
            }

            debug!(turn = turns, tool_count = calls.len(), "Executing tool calls");
            let executions = calls.iter().map(|(_, name, input)| self.execute_tool(name, input));
            let outcome = self.bounded(started, join_all(executions)).await;
            let results = match outcome {
                Ok(results) => results,
                Err(e) => {
                    // Every tool_use must be answered before the transcript is replayed.
                    warn!(
                        conversation_id = %conversation.id,
                        pending = calls.len(),
                        "Deadline hit during tool calls"
                    );
                    let blocks = calls
                        .iter()
                        .map(|(id, _, _)| ContentBlock::tool_error(id.clone(), "Error: deadline exceeded"))
                        .collect();
                    conversation.push(Message::tool_results(blocks));
                    return Err(e);
                }
            };

            let mut blocks = Vec::with_capacity(results.len());
            for ((id, name, input), (result, is_error)) in calls.into_iter().zip(results) {
                blocks.push(if is_error {
                    ContentBlock::tool_error(id, result.clone())
                } else {
                    ContentBlock::tool_result(id, result.clone())
                });
                tool_log.push(ToolLogEntry {
                    tool: name,
                    input,
                    result,
                    is_error,
                });
            }
            conversation.push(Message::tool_results(blocks));
        }
    }

    async fn execute_tool(&self, name: &str, input: &serde_json::Value) -> (String, bool) {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = %name, "Model requested an unknown tool");
            return (format!("Error: Unknown tool '{name}'"), true);
        };

        let start = std::time::Instant::now();
        let outcome = tool.call(input.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                debug!(tool = %name, duration_ms, "Tool succeeded");
                (output, false)
            }
            Err(e) => {
                warn!(tool = %name, duration_ms, error = %e, "Tool execution failed");
                (format!("Error: {e}"), true)
            }
        }
    }

    async fn bounded<F: Future>(&self, started: Instant, fut: F) -> Result<F::Output> {
        let Some(limit) = self.deadline else {
            return Ok(fut.await);
        };
        let remaining = limit.saturating_sub(started.elapsed());
        tokio::time::timeout(remaining, fut)
            .await
            .map_err(|_| Error::DeadlineExceeded {
                elapsed_ms: started.elapsed().as_millis() as u64,
            })
    }
}
