//! Prompt to SQL generation.

use crate::completion::{CompletionClient, CompletionRequest};
use crate::config::{CompletionConfig, ConfigLayers};
use crate::credential::Credential;
use crate::error::PgtqResult;
use crate::openai::OpenAiClient;
use crate::validate::raise_if_invalid_query;

/// Per-call options for [`QueryGenerator::generate_query`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Reject output that is not a non-empty, parseable Postgres query.
    pub validate_sql: bool,
    /// Request parameters layered above the defaults and the config file.
    pub overrides: CompletionConfig,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable validation of the generated query.
    pub fn validate_sql(mut self, validate: bool) -> Self {
        self.validate_sql = validate;
        self
    }

    /// Override one request parameter for this call.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.overrides.insert(key, value);
        self
    }

    /// Replace all per-call overrides.
    pub fn overrides(mut self, overrides: CompletionConfig) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Turns natural-language prompts into Postgres queries via a completion service.
///
/// # Example
/// ```ignore
/// use pg_text_query::{GenerateOptions, QueryGenerator};
///
/// let generator = QueryGenerator::from_env()?;
/// let sql = generator
///     .generate_query(
///         "-- Postgres: top 5 customers by revenue\nSELECT",
///         &GenerateOptions::new().validate_sql(true).set("temperature", 0),
///     )
///     .await?;
/// ```
#[derive(Debug)]
pub struct QueryGenerator<C = OpenAiClient> {
    client: C,
    credential: Credential,
    layers: ConfigLayers,
}

impl QueryGenerator<OpenAiClient> {
    /// Generator wired from the environment: `OPENAI_API_KEY` (resolved on
    /// first use), `OPENAI_BASE_URL` and `PGTQ_OPENAI_CONFIG`.
    pub fn from_env() -> PgtqResult<Self> {
        Ok(Self::new(
            OpenAiClient::from_env(),
            Credential::from_env(),
            ConfigLayers::from_env()?,
        ))
    }
}

impl<C: CompletionClient> QueryGenerator<C> {
    pub fn new(client: C, credential: Credential, layers: ConfigLayers) -> Self {
        Self {
            client,
            credential,
            layers,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn layers(&self) -> &ConfigLayers {
        &self.layers
    }

    /// The parameters a request with these overrides would be sent with.
    pub fn effective_config(&self, overrides: &CompletionConfig) -> CompletionConfig {
        self.layers.resolve(overrides)
    }

    /// Generate a raw Postgres query string from `prompt`.
    ///
    /// Fails with [`crate::PgtqError::EnvVar`] before any request when no API
    /// key is available. With `validate_sql`, output that does not parse or
    /// parses to nothing fails with [`crate::PgtqError::QueryGen`]; this
    /// checks that the query is non-empty and syntactically valid, not that it
    /// is correct. Service errors are returned unchanged.
    pub async fn generate_query(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> PgtqResult<String> {
        let api_key = self.credential.resolve()?;
        let config = self.effective_config(&options.overrides);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pg_text_query.generate",
            model = ?config.get("model"),
            prompt_len = prompt.len(),
            overrides = ?options.overrides.keys().collect::<Vec<_>>(),
            validate_sql = options.validate_sql,
            "requesting completion"
        );

        let response = self
            .client
            .create(CompletionRequest {
                api_key,
                prompt,
                config: &config,
            })
            .await?;

        let generated = response.first_text()?.to_string();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pg_text_query.generate",
            choices = response.choices.len(),
            generated_len = generated.len(),
            "completion received"
        );

        if options.validate_sql {
            raise_if_invalid_query(&generated)?;
        }

        Ok(generated)
    }
}

/// One-shot helper: build a generator from the environment and run it once.
///
/// Prefer a long-lived [`QueryGenerator`] when issuing several requests; it
/// resolves the credential and reads the config file only once.
pub async fn generate_query(
    prompt: &str,
    validate_sql: bool,
    overrides: CompletionConfig,
) -> PgtqResult<String> {
    let options = GenerateOptions {
        validate_sql,
        overrides,
    };
    QueryGenerator::from_env()?
        .generate_query(prompt, &options)
        .await
}
