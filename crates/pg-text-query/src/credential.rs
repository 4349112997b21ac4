//! API credential resolution.
//!
//! A [`Credential`] asks its [`CredentialSource`] at most once for a non-empty
//! key and caches the answer for the rest of its lifetime.

use std::fmt;
use std::sync::OnceLock;

use crate::error::{PgtqError, PgtqResult};

/// Environment variable holding the completion API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Something that can look up an API key.
pub trait CredentialSource: Send + Sync {
    /// Return the key, or `None` if it is not available.
    fn lookup(&self) -> Option<String>;

    /// Human-readable name of the source, used in error messages.
    fn describe(&self) -> String;
}

/// Reads the key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(API_KEY_ENV)
    }
}

impl CredentialSource for EnvCredential {
    fn lookup(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }

    fn describe(&self) -> String {
        self.var.clone()
    }
}

/// A key supplied directly by the caller.
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticCredential(..)")
    }
}

impl CredentialSource for StaticCredential {
    fn lookup(&self) -> Option<String> {
        Some(self.0.clone())
    }

    fn describe(&self) -> String {
        "static credential".to_string()
    }
}

/// A lazily resolved, cached API key.
pub struct Credential {
    source: Box<dyn CredentialSource>,
    resolved: OnceLock<String>,
}

impl Credential {
    pub fn new(source: impl CredentialSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            resolved: OnceLock::new(),
        }
    }

    /// Credential backed by `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(EnvCredential::default())
    }

    /// Credential with a fixed key.
    pub fn fixed(key: impl Into<String>) -> Self {
        Self::new(StaticCredential::new(key))
    }

    /// Return the cached key, resolving it from the source on first use.
    ///
    /// An unset or empty key is an [`PgtqError::EnvVar`]; the source is asked
    /// again next time until it produces a key.
    pub fn resolve(&self) -> PgtqResult<&str> {
        if let Some(key) = self.resolved.get() {
            return Ok(key);
        }

        let key = self
            .source
            .lookup()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                PgtqError::env_var(format!("{} not found in environment", self.source.describe()))
            })?;

        Ok(self.resolved.get_or_init(|| key))
    }

    /// Whether a key has already been resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("source", &self.source.describe())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
        key: Option<&'static str>,
    }

    impl CredentialSource for Counting {
        fn lookup(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.key.map(str::to_string)
        }

        fn describe(&self) -> String {
            "TEST_KEY".to_string()
        }
    }

    #[test]
    fn resolves_once_and_caches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cred = Credential::new(Counting {
            calls: calls.clone(),
            key: Some("sk-test"),
        });

        assert!(!cred.is_resolved());
        assert_eq!(cred.resolve().unwrap(), "sk-test");
        assert_eq!(cred.resolve().unwrap(), "sk-test");
        assert!(cred.is_resolved());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_key_is_env_var_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cred = Credential::new(Counting {
            calls: calls.clone(),
            key: None,
        });

        let err = cred.resolve().unwrap_err();
        assert!(err.is_env_var());
        assert!(err.to_string().contains("TEST_KEY not found in environment"));

        // Not cached: asked again.
        let _ = cred.resolve();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_key_counts_as_missing() {
        let cred = Credential::fixed("");
        assert!(cred.resolve().unwrap_err().is_env_var());
    }

    #[test]
    fn unset_env_var_fails() {
        let cred = Credential::new(EnvCredential::new("PGTQ_TEST_SURELY_UNSET_API_KEY"));
        let err = cred.resolve().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Environment variable error: PGTQ_TEST_SURELY_UNSET_API_KEY not found in environment"
        );
    }

    #[test]
    fn debug_hides_key() {
        let cred = Credential::fixed("sk-secret");
        cred.resolve().unwrap();
        let dbg = format!("{cred:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("resolved: true"));
    }
}
