//! Credential verification for the admin login.
//!
//! The session gate only depends on the [`CredentialVerifier`] trait, so
//! the mechanism can be swapped without touching the login control flow.
//! The only implementation compares against a configured pair in constant
//! time.

use subtle::ConstantTimeEq;

use crate::config::AdminConfig;

/// A capability that decides whether a credential pair is valid.
pub trait CredentialVerifier: Send + Sync {
    /// Returns `true` if the pair matches exactly.
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// A verifier holding a single configured credential pair.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl From<&AdminConfig> for StaticCredentials {
    fn from(config: &AdminConfig) -> Self {
        Self::new(&config.username, &config.password)
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        // Both halves are always compared so the timing does not reveal
        // which one was wrong.
        let username_matches = self.username.as_bytes().ct_eq(username.as_bytes());
        let password_matches = self.password.as_bytes().ct_eq(password.as_bytes());
        bool::from(username_matches & password_matches)
    }
}
