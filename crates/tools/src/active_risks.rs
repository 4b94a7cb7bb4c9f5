//! Active risks tool: reads a project's ranked risk list from shared memory.

use async_trait::async_trait;
use foreman_core::error::ToolError;
use foreman_core::tool::Tool;
use foreman_store::SharedMemory;

const DEFAULT_LIMIT: u64 = 10;

pub struct ActiveRisksTool {
    memory: SharedMemory,
}

impl ActiveRisksTool {
    pub fn new(memory: SharedMemory) -> Self {
        Self { memory }
    }
}

#[async_trait]
impl Tool for ActiveRisksTool {
    fn name(&self) -> &str {
        "active_risks"
    }

    fn description(&self) -> &str {
        "List a project's active risks, highest score first, as reported by the fleet."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "string",
                    "description": "Project identifier"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum risks to return (default 10)",
                    "minimum": 1
                }
            },
            "required": ["project_id"]
        })
    }

    async fn call(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let project_id = input["project_id"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'project_id' argument".into()))?;
        let limit = input["limit"].as_u64().unwrap_or(DEFAULT_LIMIT).max(1) as usize;

        let risks = self
            .memory
            .top_risks(project_id, limit)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "active_risks".into(),
                reason: e.to_string(),
            })?;

        let items: Vec<serde_json::Value> = risks
            .into_iter()
            .map(|(risk_id, score)| serde_json::json!({"risk_id": risk_id, "score": score}))
            .collect();
        Ok(serde_json::json!({"project_id": project_id, "risks": items}).to_string())
    }
}
