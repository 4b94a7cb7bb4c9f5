//! Scripted collaborators shared by the agent tests.

use async_trait::async_trait;
use foreman_core::error::{ProviderError, ToolError};
use foreman_core::message::ContentBlock;
use foreman_core::provider::{CompletionRequest, CompletionResponse, Provider, StopReason};
use foreman_core::tool::{Tool, ToolRegistry};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

enum Script {
    Queue(VecDeque<CompletionResponse>),
    Repeat(CompletionResponse),
    Fail(ProviderError),
}

/// A provider that replays canned turns and records every request.
pub struct ScriptedProvider {
    script: Mutex<Script>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<CompletionResponse>) -> Self {
        Self::from_script(Script::Queue(turns.into()))
    }

    pub fn repeating(turn: CompletionResponse) -> Self {
        Self::from_script(Script::Repeat(turn))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::from_script(Script::Fail(error))
    }

    fn from_script(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut script = self.script.lock().unwrap();
        match &mut *script {
            Script::Queue(turns) => Ok(turns.pop_front().unwrap_or_else(|| text_turn("(script exhausted)"))),
            Script::Repeat(turn) => Ok(turn.clone()),
            Script::Fail(error) => Err(error.clone()),
        }
    }
}

fn turn(content: Vec<ContentBlock>, stop_reason: StopReason) -> CompletionResponse {
    CompletionResponse {
        content,
        stop_reason,
        usage: None,
        model: "mock-model".into(),
    }
}

pub fn text_turn(text: &str) -> CompletionResponse {
    turn(vec![ContentBlock::text(text)], StopReason::EndTurn)
}

pub fn empty_turn() -> CompletionResponse {
    turn(Vec::new(), StopReason::EndTurn)
}

pub fn tool_turn(calls: &[(&str, &str, serde_json::Value)]) -> CompletionResponse {
    let blocks = calls
        .iter()
        .map(|(id, name, input)| ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input: input.clone(),
        })
        .collect();
    turn(blocks, StopReason::ToolUse)
}

/// Echoes `text`; fails when `fail` is set. The `slow` variant sleeps first.
pub struct EchoTool {
    name: &'static str,
    delay: Option<Duration>,
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Echo the given text"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } }
        })
    }

    async fn call(&self, input: serde_json::Value) -> Result<String, ToolError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if input["fail"].as_bool() == Some(true) {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.name.into(),
                reason: "asked to fail".into(),
            });
        }
        Ok(input["text"].as_str().unwrap_or_default().to_string())
    }
}

/// Registry holding `echo` and/or `slow` in the order given.
pub fn registry_with(names: &[&'static str]) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for &name in names {
        let delay = (name == "slow").then(|| Duration::from_millis(30));
        registry.register(Box::new(EchoTool { name, delay }));
    }
    registry
}
