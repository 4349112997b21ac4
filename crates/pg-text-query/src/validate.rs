//! Validation of generated queries against the Postgres parser.
//!
//! A query is usable when `pg_query` parses it into at least one statement.
//! Input that parses to nothing (the empty string, whitespace, or only SQL
//! comments) is rejected as well as input that does not parse.
//!
//! # Example
//! ```
//! use pg_text_query::{Validation, raise_if_invalid_query, validate_query};
//!
//! assert!(validate_query("SELECT 1;").is_valid());
//! assert!(matches!(validate_query("-- just a comment"), Validation::Empty));
//! assert!(raise_if_invalid_query("SELEKT * FRM x").is_err());
//! ```

use crate::error::{PgtqResult, QueryGenError};

/// Outcome of validating a query.
#[derive(Debug)]
pub enum Validation {
    /// Parsed into `statements` top-level statements (at least one).
    Valid { statements: usize },
    /// The parser rejected the query.
    InvalidSyntax(pg_query::Error),
    /// Parsed, but into zero statements.
    Empty,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Convert the invalid cases into a [`QueryGenError`].
    pub fn into_result(self) -> Result<usize, QueryGenError> {
        match self {
            Self::Valid { statements } => Ok(statements),
            Self::InvalidSyntax(e) => Err(QueryGenError::InvalidSyntax(e)),
            Self::Empty => Err(QueryGenError::Empty),
        }
    }
}

/// Classify `query` using the Postgres parser.
///
/// The query is parsed exactly as given; no trimming happens first.
pub fn validate_query(query: &str) -> Validation {
    let validation = match pg_query::parse(query) {
        Err(e) => Validation::InvalidSyntax(e),
        Ok(parsed) if parsed.protobuf.stmts.is_empty() => Validation::Empty,
        Ok(parsed) => Validation::Valid {
            statements: parsed.protobuf.stmts.len(),
        },
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "pg_text_query.validate",
        outcome = ?validation,
        query_len = query.len(),
        "validated generated query"
    );

    validation
}

/// Return an error if `query` is not a non-empty, parseable Postgres query.
pub fn raise_if_invalid_query(query: &str) -> PgtqResult<()> {
    validate_query(query).into_result()?;
    Ok(())
}
