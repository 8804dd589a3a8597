//! Common authentication error types
//!
//! Two failure classes exist. Wiring and configuration faults are raised as
//! [`ConfigurationError`] and must never be treated as "no user". Ordinary
//! authentication failures (missing cookie, unknown user, stale token, wrong
//! secret) are not errors at all: they surface as `Ok(None)`.

use thiserror::Error;

/// Startup or wiring fault detected while building or running an authenticator
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The request context carries no cookie collaborator
    #[error("cookie store is not available for this request")]
    MissingCookieStore,

    /// A required option was empty or absent
    #[error("missing required option `{0}`")]
    MissingOption(&'static str),

    /// A relative duration such as `+2 weeks` could not be parsed
    #[error("invalid duration `{value}` for option `{option}`")]
    InvalidDuration { option: &'static str, value: String },

    /// The username and password fields point at the same column
    #[error("username and password fields must differ, both are `{0}`")]
    ConflictingFields(String),

    /// Unknown cookie encryption scheme
    #[error("unsupported cookie crypt `{0}`")]
    UnsupportedCrypt(String),

    /// The password hasher could not be built from its crypto context
    #[error("invalid password hasher parameters: {0}")]
    InvalidHasher(String),
}

/// Error returned by the authenticator entry points
///
/// Only faults land here. A request that simply cannot be authenticated
/// returns `Ok(None)` so callers cannot tell the reasons apart.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// Wiring or configuration fault
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The user store failed to complete the lookup
    #[error("user store lookup failed: {0}")]
    UserStore(#[source] anyhow::Error),

    /// The session collaborator rejected the write
    #[error("session write failed: {0}")]
    Session(#[source] anyhow::Error),
}

impl AuthenticationError {
    /// Whether this error is a wiring fault rather than collaborator I/O
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, AuthenticationError::Configuration(_))
    }
}
