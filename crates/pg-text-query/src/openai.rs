//! HTTP client for the OpenAI-compatible `/completions` endpoint.

use serde::Deserialize;

use crate::completion::{CompletionClient, CompletionError, CompletionRequest, CompletionResponse};

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Completion client speaking the OpenAI HTTP API.
///
/// No timeout is configured beyond `reqwest`'s own defaults, and nothing is
/// retried.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiClient {
    /// Client against [`DEFAULT_BASE_URL`].
    pub fn new() -> Self {
        Self::with_http(reqwest::Client::new())
    }

    /// Client using a caller-configured `reqwest::Client`.
    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Client against `OPENAI_BASE_URL` if set, else the default.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new().base_url(url),
            _ => Self::new(),
        }
    }

    /// Override the API base URL (e.g. a proxy or compatible server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default, deserialize_with = "code_as_string")]
    code: Option<String>,
}

// The API sends `code` as a string, a number, or null.
fn code_as_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(de)?;
    Ok(match v {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Map a non-success response body to a [`CompletionError`].
pub(crate) fn error_from_body(status: u16, body: String) -> CompletionError {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => CompletionError::Api {
            status,
            message: env.error.message,
            kind: env.error.kind,
            code: env.error.code,
        },
        Err(_) => CompletionError::Status { status, body },
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiClient {
    async fn create(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, CompletionError> {
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(request.api_key)
            .json(&request.body())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            return Err(error_from_body(status.as_u16(), body));
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }
}
