//! Current time tool. The model has no clock of its own.

use async_trait::async_trait;
use chrono::Utc;
use foreman_core::error::ToolError;
use foreman_core::tool::Tool;

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in UTC."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn call(&self, _input: serde_json::Value) -> Result<String, ToolError> {
        Ok(Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn formats_as_utc_timestamp() {
        let out = CurrentTimeTool.execute(serde_json::json!({})).await;
        assert!(out.ends_with(" UTC"));
        let stamp = out.trim_end_matches(" UTC");
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
