//! The completion service seam.
//!
//! [`CompletionClient`] is the only thing the generator needs from the remote
//! service: send a prompt plus request parameters, get candidate texts back.
//! [`crate::OpenAiClient`] is the HTTP implementation; tests substitute their
//! own.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::CompletionConfig;

/// A request to the completion service.
#[derive(Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub api_key: &'a str,
    pub prompt: &'a str,
    pub config: &'a CompletionConfig,
}

impl fmt::Debug for CompletionRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionRequest")
            .field("api_key", &"<redacted>")
            .field("prompt", &self.prompt)
            .field("config", &self.config)
            .finish()
    }
}

impl CompletionRequest<'_> {
    /// JSON body for the request: the parameters plus `prompt`.
    ///
    /// A `prompt` key in the parameters is replaced by the actual prompt.
    pub fn body(&self) -> serde_json::Value {
        let mut body = self.config.as_map().clone();
        body.insert(
            "prompt".to_string(),
            serde_json::Value::String(self.prompt.to_string()),
        );
        serde_json::Value::Object(body)
    }
}

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// The service's answer to a completion request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Response with a single choice, mostly for tests and fakes.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                text: text.into(),
                index: 0,
                finish_reason: Some("stop".to_string()),
            }],
            ..Self::default()
        }
    }

    /// Text of the first choice.
    pub fn first_text(&self) -> Result<&str, CompletionError> {
        self.choices
            .first()
            .map(|c| c.text.as_str())
            .ok_or(CompletionError::NoChoices)
    }
}

/// Errors raised by the completion service.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport or decoding failure.
    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error envelope.
    #[error("Completion API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        kind: Option<String>,
        code: Option<String>,
    },

    /// Non-success status with a body that is not an error envelope.
    #[error("Completion API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response carried no choices.
    #[error("Completion response contained no choices")]
    NoChoices,
}

impl CompletionError {
    /// HTTP status code, when the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::NoChoices => None,
        }
    }
}

/// A text-completion service.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue one completion request.
    async fn create(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, CompletionError>;
}

#[async_trait::async_trait]
impl<C: CompletionClient + ?Sized> CompletionClient for &C {
    async fn create(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, CompletionError> {
        (**self).create(request).await
    }
}

#[async_trait::async_trait]
impl<C: CompletionClient + ?Sized> CompletionClient for Box<C> {
    async fn create(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, CompletionError> {
        (**self).create(request).await
    }
}
