//! Capability abstraction over the hosted model
//!
//! The loop depends on this trait rather than on a concrete HTTP client so
//! tests can script both the generation and extraction sides.

use async_trait::async_trait;
use gutcheck_ai::{ChatClient, Message, Tool};

/// The two externally hosted calls the loop suspends on
#[async_trait]
pub trait Capability: Send + Sync {
    /// Produce one assistant entry for the given instruction and history
    async fn generate(
        &self,
        system: &str,
        history: &[Message],
        tools: &[Tool],
    ) -> gutcheck_ai::Result<Message>;

    /// Produce schema-conformant structured output for the given prompts
    async fn extract(
        &self,
        system: &str,
        prompt: &str,
        name: &str,
        schema: &serde_json::Value,
    ) -> gutcheck_ai::Result<serde_json::Value>;
}

/// Production capability backed by an OpenAI-compatible endpoint
pub struct OpenAiCapability {
    client: ChatClient,
}

impl OpenAiCapability {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Build from the OPENAI_API_KEY environment variable
    pub fn from_env() -> gutcheck_ai::Result<Self> {
        Ok(Self::new(ChatClient::from_env()?))
    }
}

#[async_trait]
impl Capability for OpenAiCapability {
    async fn generate(
        &self,
        system: &str,
        history: &[Message],
        tools: &[Tool],
    ) -> gutcheck_ai::Result<Message> {
        self.client.generate(system, history, tools).await
    }

    async fn extract(
        &self,
        system: &str,
        prompt: &str,
        name: &str,
        schema: &serde_json::Value,
    ) -> gutcheck_ai::Result<serde_json::Value> {
        self.client.extract(system, prompt, name, schema).await
    }
}
