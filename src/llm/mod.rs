//! External text-model seam
//!
//! Everything that talks to a language model goes through [`ChatModel`]:
//! one system instruction, one user instruction, one completion back.
//! Failures are typed by [`ModelErrorKind`] so retry eligibility is decided
//! from the kind alone.

pub mod openai;
pub mod retry;

pub use openai::OpenAiClient;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// A single chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError,
    /// Transport failure or any other non-success status
    Api,
    /// Response arrived but carried no usable completion
    Malformed,
}

impl ModelErrorKind {
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ModelErrorKind::RateLimited | ModelErrorKind::ServerError | ModelErrorKind::Api
        )
    }
}

impl fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ModelErrorKind::RateLimited => "rate limited",
            ModelErrorKind::ServerError => "server error",
            ModelErrorKind::Api => "api error",
            ModelErrorKind::Malformed => "malformed response",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub message: String,
}

impl ModelError {
    pub fn new(kind: ModelErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::ServerError, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Api, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Malformed, message)
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Trait for chat-style text generation
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Return the completion text, trimmed of surrounding whitespace
    async fn complete(&self, request: &ChatRequest) -> Result<String, ModelError>;

    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Arc<T> {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ModelError> {
        (**self).complete(request).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

type Responder = Box<dyn Fn(&ChatRequest) -> Result<String, ModelError> + Send + Sync>;

/// Mock model for development & testing.
///
/// Answers from a script first, then from the responder if one is set.
/// An exhausted script with no responder yields a `Malformed` error.
pub struct MockChatModel {
    script: Mutex<VecDeque<Result<String, ModelError>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatModel {
    pub fn scripted<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ModelError>>,
    {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            responder: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::responding(move |_| Ok(reply.clone()))
    }

    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, ModelError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ModelError> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request.clone());

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();

        match (scripted, &self.responder) {
            (Some(response), _) => response,
            (None, Some(responder)) => responder(request),
            (None, None) => Err(ModelError::malformed("mock script exhausted")),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
