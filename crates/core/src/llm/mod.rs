pub mod error;
pub mod json;
pub mod openrouter;

pub use error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenRouter,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Sends `prompt` as a chat completion and returns the JSON payload found in the reply.
    async fn complete_json(&self, prompt: &str) -> Result<serde_json::Value, LlmError>;
}
