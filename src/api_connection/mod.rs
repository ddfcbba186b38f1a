pub mod connection;
pub mod endpoints;
pub mod fake;

use async_trait::async_trait;

// Re-export the pieces callers actually touch.
pub use connection::{ApiConnectionError, OPENAI_CHAT_COMPLETIONS_URL};
pub use endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Provider, ResponseFormat,
};
pub use fake::FakeBackend;

/// Anything that can serve chat completions: the live OpenAI provider,
/// or the in-process fake the tests run against.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError>;

    /// Model name to stamp on outgoing requests.
    fn model_name(&self) -> &str;
}
