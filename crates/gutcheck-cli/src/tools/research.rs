//! Web lookup for nutrition facts and additive research

use async_trait::async_trait;
use gutcheck_agent::{Tool, ToolResult};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SEARCH_URL: &str = "https://google.serper.dev/search";
const MAX_RESULTS: usize = 5;

/// Search tool backed by the Serper API
pub struct ResearchTool {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl ResearchTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }
}

#[async_trait]
impl Tool for ResearchTool {
    fn name(&self) -> &str {
        "ingredient_researcher"
    }

    fn description(&self) -> &str {
        "Search for food labels and nutritional additives."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query, e.g. 'added sugar grams per serving cola'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        arguments: serde_json::Value,
        cancel: CancellationToken,
    ) -> ToolResult {
        let query = match arguments.get("query").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolResult::error("Missing 'query' argument"),
        };
        let api_key = match &self.api_key {
            Some(k) => k,
            None => return ToolResult::error("SERPER_API_KEY is not configured"),
        };
        if cancel.is_cancelled() {
            return ToolResult::error("Operation cancelled");
        }

        let response = match self
            .client
            .post(SEARCH_URL)
            .header("X-API-KEY", api_key)
            .json(&json!({"q": query}))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("Search failed: {}", e)),
        };
        if !response.status().is_success() {
            return ToolResult::error(format!("Search failed: HTTP {}", response.status()));
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => ToolResult::text(format_results(&body)),
            Err(e) => ToolResult::error(format!("Search returned unreadable body: {}", e)),
        }
    }
}

/// Flatten a Serper response into the lines the model reads
fn format_results(body: &serde_json::Value) -> String {
    let mut lines = Vec::new();

    if let Some(answer) = body
        .get("answerBox")
        .and_then(|b| b.get("answer").or_else(|| b.get("snippet")))
        .and_then(|v| v.as_str())
    {
        lines.push(format!("Answer: {}", answer));
    }

    if let Some(organic) = body.get("organic").and_then(|v| v.as_array()) {
        for result in organic.iter().take(MAX_RESULTS) {
            let title = result.get("title").and_then(|v| v.as_str()).unwrap_or("");
            let snippet = result.get("snippet").and_then(|v| v.as_str()).unwrap_or("");
            if !title.is_empty() || !snippet.is_empty() {
                lines.push(format!("{}: {}", title, snippet));
            }
        }
    }

    if lines.is_empty() {
        "No results found.".to_string()
    } else {
        lines.join("\n")
    }
}
