use std::sync::Mutex;

use async_trait::async_trait;

use super::connection::ApiConnectionError;
use super::endpoints::{
    ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse,
    ChatCompletionResponseMessage,
};
use super::CompletionBackend;

/// In-process stand-in for the live provider. Serves canned message
/// contents in order, or fails the way the real backend would, so the
/// suggestion flow can be exercised without network access.
pub struct FakeBackend {
    behavior: FakeBehavior,
    model: String,
}

enum FakeBehavior {
    Contents(Mutex<Vec<String>>),
    NoChoices,
    Fail(FakeFailure),
}

enum FakeFailure {
    Api { status: u16, message: String },
    MissingKey(String),
}

impl FakeBackend {
    pub fn with_content(content: &str) -> Self {
        Self::with_contents(vec![content.to_string()])
    }

    pub fn with_contents(contents: Vec<String>) -> Self {
        FakeBackend {
            behavior: FakeBehavior::Contents(Mutex::new(contents)),
            model: "fake-model".to_string(),
        }
    }

    /// A backend whose responses carry no choices at all.
    pub fn no_choices() -> Self {
        FakeBackend {
            behavior: FakeBehavior::NoChoices,
            model: "fake-model".to_string(),
        }
    }

    /// A backend that fails every call with the given HTTP status.
    pub fn failing(status: u16, message: &str) -> Self {
        FakeBackend {
            behavior: FakeBehavior::Fail(FakeFailure::Api {
                status,
                message: message.to_string(),
            }),
            model: "fake-model".to_string(),
        }
    }

    /// A backend that reports the named API key variable as unset.
    pub fn missing_key(env_var_name: &str) -> Self {
        FakeBackend {
            behavior: FakeBehavior::Fail(FakeFailure::MissingKey(env_var_name.to_string())),
            model: "fake-model".to_string(),
        }
    }

    fn response_for(
        &self,
        request: &ChatCompletionRequest,
        content: Option<String>,
    ) -> ChatCompletionResponse {
        let choices = content
            .map(|content| {
                vec![ChatCompletionChoice {
                    message: ChatCompletionResponseMessage {
                        role: "assistant".to_string(),
                        content,
                    },
                    finish_reason: Some("stop".to_string()),
                    index: 0,
                }]
            })
            .unwrap_or_default();

        ChatCompletionResponse {
            id: "fake-completion".to_string(),
            object: None,
            created: 0,
            model: request.model.clone(),
            choices,
            usage: None,
        }
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match &self.behavior {
            FakeBehavior::Contents(queue) => {
                let mut queue = queue.lock().unwrap();
                if queue.is_empty() {
                    return Err(ApiConnectionError::ApiError {
                        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                        error_body: "no canned response left".to_string(),
                    });
                }
                let content = queue.remove(0);
                Ok(self.response_for(&request, Some(content)))
            }
            FakeBehavior::NoChoices => Ok(self.response_for(&request, None)),
            FakeBehavior::Fail(FakeFailure::Api { status, message }) => {
                Err(ApiConnectionError::ApiError {
                    status: reqwest::StatusCode::from_u16(*status)
                        .unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
                    error_body: message.clone(),
                })
            }
            FakeBehavior::Fail(FakeFailure::MissingKey(env_var_name)) => {
                Err(ApiConnectionError::MissingApiKey(env_var_name.clone()))
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
