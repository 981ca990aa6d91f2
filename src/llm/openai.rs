//! OpenAI-compatible chat completions client
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use super::{ChatModel, ChatRequest, ModelError};
use crate::error::EnrichError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Reusable chat completions client (connection-pooled)
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| {
                EnrichError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ModelError> {
        let body = CompletionRequest::from_chat(&self.model, request);

        debug!(model = %self.model, "Calling chat completions API");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completions request failed: {}", e);
                ModelError::api(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Chat completions error response: {}", error_text);
            return Err(error_for_status(status, &error_text));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse chat completions response: {}", e);
            ModelError::malformed(format!("parse error: {}", e))
        })?;

        completion_text(completion)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Map a non-success HTTP status to an error kind.
///
/// Every status is retryable; only a response without a usable completion is not.
pub fn error_for_status(status: StatusCode, body: &str) -> ModelError {
    let message = format!("HTTP {}: {}", status.as_u16(), body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => ModelError::rate_limited(message),
        s if s.is_server_error() => ModelError::server(message),
        _ => ModelError::api(message),
    }
}

fn completion_text(completion: CompletionResponse) -> Result<String, ModelError> {
    if let Some(usage) = &completion.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Chat completion received"
        );
    }

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::malformed("no choices in response"))?;

    if let Some(reason) = choice.finish_reason.as_deref().filter(|r| *r != "stop") {
        debug!(finish_reason = %reason, "Completion did not finish normally");
    }

    let content = choice
        .message
        .content
        .ok_or_else(|| ModelError::malformed("empty message content"))?;

    Ok(content.trim().to_string())
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

impl<'a> CompletionRequest<'a> {
    fn from_chat(model: &'a str, request: &'a ChatRequest) -> Self {
        Self {
            model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
