//! Error types for pg-text-query

use thiserror::Error;

use crate::completion::CompletionError;

/// Result type alias for pg-text-query operations.
pub type PgtqResult<T> = Result<T, PgtqError>;

/// Error type for pg-text-query operations.
#[derive(Debug, Error)]
pub enum PgtqError {
    /// A required environment variable (the API credential) is missing.
    #[error("Environment variable error: {0}")]
    EnvVar(String),

    /// The generated query failed validation.
    #[error(transparent)]
    QueryGen(#[from] QueryGenError),

    /// Error raised by the completion service, surfaced as-is.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// Configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),
}

impl PgtqError {
    /// Create an environment variable error.
    pub fn env_var(message: impl Into<String>) -> Self {
        Self::EnvVar(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a missing-credential error.
    pub fn is_env_var(&self) -> bool {
        matches!(self, Self::EnvVar(_))
    }

    /// Check if this is a query validation error.
    pub fn is_query_gen(&self) -> bool {
        matches!(self, Self::QueryGen(_))
    }

    /// Check if this error came from the completion service.
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::Completion(_))
    }

    /// The validation error, if this is one.
    pub fn as_query_gen(&self) -> Option<&QueryGenError> {
        match self {
            Self::QueryGen(e) => Some(e),
            _ => None,
        }
    }
}

/// Why a generated query was rejected.
///
/// "Invalid" here is stricter than "not valid Postgres": a query that parses
/// to zero statements (empty input, or only a comment) is rejected too.
#[derive(Debug, Error)]
pub enum QueryGenError {
    /// The parser rejected the query.
    #[error("Generated query is not valid PostgreSQL")]
    InvalidSyntax(#[source] pg_query::Error),

    /// The query parsed to zero statements.
    #[error("Generated query is empty or a SQL comment")]
    Empty,
}

impl QueryGenError {
    pub fn is_invalid_syntax(&self) -> bool {
        matches!(self, Self::InvalidSyntax(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
