//! Flagging harmful ingredients for the transcript

use async_trait::async_trait;
use gutcheck_agent::{Tool, ToolResult};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Tool that records a harmful ingredient and the reason it was flagged
pub struct FlagIngredientTool;

impl FlagIngredientTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FlagIngredientTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FlagIngredientTool {
    fn name(&self) -> &str {
        "flag_harmful_ingredient"
    }

    fn description(&self) -> &str {
        "Mark ingredients as dangerous for the UI."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "ingredient_name": {
                    "type": "string",
                    "description": "Name of the ingredient being flagged"
                },
                "reason": {
                    "type": "string",
                    "description": "Why the ingredient is harmful"
                }
            },
            "required": ["ingredient_name", "reason"]
        })
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        arguments: serde_json::Value,
        _cancel: CancellationToken,
    ) -> ToolResult {
        let name = match arguments.get("ingredient_name").and_then(|v| v.as_str()) {
            Some(n) => n,
            None => return ToolResult::error("Missing 'ingredient_name' argument"),
        };
        let reason = match arguments.get("reason").and_then(|v| v.as_str()) {
            Some(r) => r,
            None => return ToolResult::error("Missing 'reason' argument"),
        };
        ToolResult::text(format!("FLAGGED: {}. REASON: {}", name, reason))
    }
}
