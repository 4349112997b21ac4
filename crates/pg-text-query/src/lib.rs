//! pg-text-query
//!
//! Generate PostgreSQL queries from natural-language prompts using a remote
//! text-completion service, optionally checking the result with the Postgres
//! parser (via `pg_query`).
//!
//! # Features
//!
//! - **Layered request config**: bundled defaults, an optional TOML/YAML file
//!   (`PGTQ_OPENAI_CONFIG`), and per-call overrides; the last layer wins per key
//! - **Lazy credential**: `OPENAI_API_KEY` is resolved once, on first use, and
//!   a missing key fails before any request is sent
//! - **Validation**: reject output that does not parse, or parses to nothing
//!   (empty or only a SQL comment)
//! - **Pluggable service**: anything implementing [`CompletionClient`]
//!
//! # Example
//!
//! ```ignore
//! use pg_text_query::{GenerateOptions, QueryGenerator};
//!
//! let generator = QueryGenerator::from_env()?;
//! let sql = generator
//!     .generate_query(
//!         "top 5 customers by revenue",
//!         &GenerateOptions::new().validate_sql(true).set("temperature", 0),
//!     )
//!     .await?;
//! println!("{sql}");
//! ```

pub mod completion;
pub mod config;
pub mod credential;
pub mod error;
pub mod generate;
pub mod openai;
pub mod validate;

pub use completion::{
    Choice, CompletionClient, CompletionError, CompletionRequest, CompletionResponse, Usage,
};
pub use config::{
    CONFIG_PATH_ENV, CONFIG_SECTION, CompletionConfig, ConfigLayers, ConfigOrigin,
    builtin_config, load_config_file, merge_layers,
};
pub use credential::{API_KEY_ENV, Credential, CredentialSource, EnvCredential, StaticCredential};
pub use error::{PgtqError, PgtqResult, QueryGenError};
pub use generate::{GenerateOptions, QueryGenerator, generate_query};
pub use openai::{BASE_URL_ENV, DEFAULT_BASE_URL, OpenAiClient};
pub use validate::{Validation, raise_if_invalid_query, validate_query};
