//! OpenAI-compatible Chat Completions client

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{AssistantMetadata, Content, Message, StopReason, Tool, Usage},
};

/// Default model, matches the hosted deployment
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible Chat Completions endpoint
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: Option<u32>,
}

impl ChatClient {
    /// Create a new client with an API key and the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: None,
        }
    }

    /// Create from the OPENAI_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::InvalidApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Override the model ID
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the base URL (for proxies and compatible servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Limit output tokens per response
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Model ID this client sends requests for
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate one assistant message for the given history.
    ///
    /// The system instruction is passed separately and always occupies the
    /// first slot of the request, so the caller can rebuild it per call
    /// without touching the history. When `tools` is non-empty the model may
    /// answer with tool calls instead of text.
    pub async fn generate(
        &self,
        system: &str,
        history: &[Message],
        tools: &[Tool],
    ) -> Result<Message> {
        let request = self.build_request(system, history, tools, None);
        let response = self.post(&request).await?;
        self.parse_assistant(response)
    }

    /// Run a schema-constrained extraction over the given prompts.
    ///
    /// The schema is presented as a single function the model is forced to
    /// call; the parsed function arguments are returned. A reply without a
    /// matching call is a [`Error::Schema`] failure.
    pub async fn extract(
        &self,
        system: &str,
        prompt: &str,
        name: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let output_tool = Tool::new(name, "Record the structured verdict.", schema.clone());
        let history = [Message::user(prompt)];
        let request = self.build_request(
            system,
            &history,
            std::slice::from_ref(&output_tool),
            Some(serde_json::json!({"type": "function", "function": {"name": name}})),
        );
        let response = self.post(&request).await?;
        let message = self.parse_assistant(response)?;

        let calls = message.tool_calls();
        match calls.iter().find(|(_, n, _)| *n == name) {
            Some((_, _, arguments)) => Ok((*arguments).clone()),
            None => Err(Error::Schema(format!(
                "model did not call '{}' (got: {})",
                name,
                message.text()
            ))),
        }
    }

    async fn post(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %request.model, messages = request.messages.len(), "chat request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(Error::RateLimited { retry_after });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::InvalidApiKey);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (error_type, message) = parse_api_error(&body, status.as_u16());
            return Err(Error::api(error_type, message));
        }

        Ok(response.json().await?)
    }

    fn parse_assistant(&self, response: ChatResponse) -> Result<Message> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse("response contained no choices".into()))?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content {
            if !text.is_empty() {
                content.push(Content::Text { text });
            }
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            let arguments = serde_json::from_str(&call.function.arguments)
                .unwrap_or(serde_json::json!({}));
            content.push(Content::ToolCall {
                id: call.id,
                name: call.function.name,
                arguments,
            });
        }

        let stop_reason = match choice.finish_reason.as_deref() {
            Some("stop") => Some(StopReason::Stop),
            Some("length") => Some(StopReason::Length),
            Some("tool_calls") => Some(StopReason::ToolUse),
            _ => None,
        };

        let usage = response
            .usage
            .map(|u| Usage {
                input: u.prompt_tokens,
                output: u.completion_tokens,
            })
            .unwrap_or_default();
        tracing::debug!(input = usage.input, output = usage.output, "chat response");

        Ok(Message::Assistant {
            content,
            metadata: AssistantMetadata {
                model: Some(self.model.clone()),
                usage,
                stop_reason,
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
        })
    }

    fn build_request(
        &self,
        system: &str,
        history: &[Message],
        tools: &[Tool],
        tool_choice: Option<serde_json::Value>,
    ) -> ChatRequest {
        let mut messages = vec![ApiMessage {
            role: "system".to_string(),
            content: Some(system.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }];
        for msg in history {
            messages.push(convert_message(msg));
        }

        let api_tools = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| ApiTool {
                        tool_type: "function".to_string(),
                        function: ApiFunction {
                            name: t.name.clone(),
                            description: Some(t.description.clone()),
                            parameters: Some(t.parameters.clone()),
                        },
                    })
                    .collect(),
            )
        };

        let tool_choice = match (&api_tools, tool_choice) {
            (Some(_), Some(choice)) => Some(choice),
            (Some(_), None) => Some(serde_json::json!("auto")),
            (None, _) => None,
        };

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: None,
            tools: api_tools,
            tool_choice,
        }
    }
}

fn convert_message(msg: &Message) -> ApiMessage {
    match msg {
        Message::User { .. } => ApiMessage {
            role: "user".to_string(),
            content: Some(msg.text()),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::Assistant { content, .. } => {
            let mut text_parts = Vec::new();
            let mut tool_calls = Vec::new();

            for c in content {
                match c {
                    Content::Text { text } => text_parts.push(text.clone()),
                    Content::ToolCall {
                        id,
                        name,
                        arguments,
                    } => {
                        tool_calls.push(ApiToolCall {
                            id: id.clone(),
                            call_type: "function".to_string(),
                            function: ApiFunctionCall {
                                name: name.clone(),
                                arguments: serde_json::to_string(arguments).unwrap_or_default(),
                            },
                        });
                    }
                }
            }

            ApiMessage {
                role: "assistant".to_string(),
                content: if text_parts.is_empty() {
                    None
                } else {
                    Some(text_parts.join(""))
                },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
                tool_call_id: None,
            }
        }
        Message::ToolResult {
            tool_call_id,
            content,
            ..
        } => ApiMessage {
            role: "tool".to_string(),
            content: Some(content.clone()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.clone()),
        },
    }
}

/// Pull type/message out of an error body, falling back to the raw text
fn parse_api_error(body: &str, status: u16) -> (String, String) {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => (
            parsed.error.error_type.unwrap_or_else(|| format!("http_{}", status)),
            parsed.error.message.unwrap_or_else(|| body.to_string()),
        ),
        Err(_) => (format!("http_{}", status), body.to_string()),
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ApiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize)]
struct ApiFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize)]
struct ApiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChoiceToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChoiceToolCall {
    id: String,
    function: ChoiceFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ChoiceFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
