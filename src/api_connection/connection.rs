use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::error::Error;
use std::fmt;
use tracing::debug;

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, Provider};
use super::CompletionBackend;

pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug)]
pub enum ApiConnectionError {
    MissingApiKey(String),
    NetworkError(reqwest::Error),
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
}

impl fmt::Display for ApiConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiConnectionError::MissingApiKey(key_name) => {
                write!(f, "API key not found in environment: {}", key_name)
            }
            ApiConnectionError::NetworkError(err) => write!(f, "Network error: {}", err),
            ApiConnectionError::ApiError { status, error_body } => {
                write!(f, "API error {}: {}", status, error_body)
            }
        }
    }
}

impl Error for ApiConnectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiConnectionError::NetworkError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiConnectionError {
    fn from(err: reqwest::Error) -> Self {
        ApiConnectionError::NetworkError(err)
    }
}

impl Provider {
    /// OpenAI provider reading its key from the named environment
    /// variable and its model from OPENAI_MODEL.
    pub fn openai(api_key_env_var_name: &str) -> Self {
        dotenv().ok();
        Self::OpenAi {
            api_key_env_var: api_key_env_var_name.to_string(),
            model: super::endpoints::model_from_env(),
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            Provider::OpenAi { model, .. } => model,
        }
    }

    /// Send a chat completion request to the provider.
    ///
    /// The API key is resolved from the environment on every call, so a
    /// missing key surfaces here rather than at construction. No
    /// client-side timeout is configured; slow upstreams block until
    /// reqwest's own limits kick in.
    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenAi {
                api_key_env_var: api_key_env_var_name,
                ..
            } => {
                dotenv().ok();
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                let client = Client::new();
                debug!(model = %request.model, url = OPENAI_CHAT_COMPLETIONS_URL, "sending chat completion request");

                let response = client
                    .post(OPENAI_CHAT_COMPLETIONS_URL)
                    .bearer_auth(actual_api_key)
                    .header("Content-Type", "application/json")
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    Ok(chat_response)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}

#[async_trait]
impl CompletionBackend for Provider {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        self.call_chat_completion(request).await
    }

    fn model_name(&self) -> &str {
        Provider::model_name(self)
    }
}
