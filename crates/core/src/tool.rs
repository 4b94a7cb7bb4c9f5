//! Tool trait: the abstraction over assistant capabilities.
//!
//! A tool declares a name, a description and a JSON Schema for its keyword
//! arguments. Execution always produces a string: failures are rendered as
//! `"Error: ..."` so a misbehaving tool can never crash the agent loop.

use async_trait::async_trait;
use std::collections::HashMap;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's arguments.
    fn input_schema(&self) -> serde_json::Value;

    /// Run the tool. Arguments are not schema-validated beforehand.
    async fn call(&self, input: serde_json::Value) -> std::result::Result<String, ToolError>;

    /// Run the tool, folding any failure into an error string.
    async fn execute(&self, input: serde_json::Value) -> String {
        match self.call(input).await {
            Ok(output) => output,
            Err(e) => format!("Error: {e}"),
        }
    }

    /// Project this tool into the provider's catalogue shape.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// A registry of available tools, kept in registration order.
///
/// Registering a name that already exists replaces the earlier tool in
/// place: the last registration wins and keeps the original slot.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => {
                tracing::debug!(tool = %name, "Replacing previously registered tool");
                self.tools[slot] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&slot| self.tools[slot].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Catalogue entries for the model, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
