//! Service factory for creating a configured remember-me authenticator
//!
//! Turns loaded `RemembrsSettings` into a validated `AuthConfig`, an Argon2id
//! hasher and the user store, and wires them into a `CookieAuthenticator`.

use crate::authentication::config::{
    parse_relative_duration, AuthConfig, CookieConfig, Crypt, FieldMap,
};
use crate::authentication::cookie_authenticator::CookieAuthenticator;
use crate::authentication::traits::UserStore;
use crate::models::ConfigurationError;
use crate::session::cookie::CookieOptions;
use crate::settings::{PasswordSettings, RemembrsSettings};
use crate::store::MemoryUserStore;
use crate::utils::crypto::{derive_encryption_key, ENCRYPTION_KEY_SIZE};
use crate::utils::password::{Argon2PasswordHasher, CryptoContext};
use chrono::Duration;
use std::path::Path;
use std::sync::Arc;

/// Request-independent values derived from settings
#[derive(Debug, Clone)]
pub struct AuthenticationConfig {
    pub encryption_key: [u8; ENCRYPTION_KEY_SIZE],
    pub session_key: String,
    pub session_duration_hours: u64,
    pub cookie_secure: bool,
}

impl AuthenticationConfig {
    /// Create authentication configuration from settings
    #[must_use]
    pub fn from_settings(settings: &RemembrsSettings) -> Self {
        Self {
            encryption_key: derive_encryption_key(settings.session.session_secret.as_bytes()),
            session_key: settings.session.session_key.clone(),
            session_duration_hours: settings.session.session_duration_hours,
            cookie_secure: settings.cookie.secure,
        }
    }

    /// Transport options for the session cookie
    #[must_use]
    pub fn session_cookie_options(&self) -> CookieOptions {
        let max_age = i64::try_from(self.session_duration_hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or_else(|| Duration::hours(24));
        CookieOptions {
            secure: self.cookie_secure,
            max_age,
            ..Default::default()
        }
    }
}

/// Factory for creating authenticators with dependency injection
pub struct AuthenticatorFactory;

impl AuthenticatorFactory {
    /// Create a fully configured `CookieAuthenticator`
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if any authenticator or password
    /// setting is invalid.
    pub fn create_authenticator(
        settings: &RemembrsSettings,
        users: Arc<dyn UserStore + Send + Sync>,
    ) -> Result<CookieAuthenticator, ConfigurationError> {
        log::info!("🏭 Starting authenticator factory...");

        let config = Self::auth_config(settings)?;
        let hasher = Self::create_hasher(&settings.password)?;
        let authenticator = CookieAuthenticator::new(config, users, Arc::new(hasher))?;

        log::info!(
            "🍪 Remember-me cookie '{}' enabled for model '{}'",
            authenticator.config().cookie.name,
            authenticator.config().user_model
        );
        if let Some(field) = &authenticator.config().token_created {
            log::info!(
                "⏱️  Ephemeral tokens checked via '{field}' (window {}s)",
                authenticator.config().expiration_window().num_seconds()
            );
        }
        log::info!("🏭 Authenticator factory completed successfully");
        Ok(authenticator)
    }

    /// Build the authenticator configuration from settings
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for an unparseable duration, an unknown
    /// crypt scheme or a field mapping that does not validate.
    pub fn auth_config(settings: &RemembrsSettings) -> Result<AuthConfig, ConfigurationError> {
        let cookie = &settings.cookie;
        let auth = &settings.authenticator;

        let token_max_age = auth
            .token_max_age
            .as_deref()
            .map(|value| parse_relative_duration("tokenMaxAge", value))
            .transpose()?;

        AuthConfig {
            cookie: CookieConfig {
                name: cookie.name.clone(),
                expires: parse_relative_duration("cookie.expires", &cookie.expires)?,
                secure: cookie.secure,
                http_only: cookie.http_only,
                path: cookie.path.clone(),
                crypt: cookie.crypt.parse::<Crypt>()?,
            },
            fields: FieldMap::new(&auth.username_field, &auth.password_field)?,
            user_model: auth.user_model.clone(),
            scope: auth.scope.clone(),
            contain: auth.contain.clone(),
            token_created: auth.token_created.clone(),
            token_max_age,
            password_required: auth.password_required,
        }
        .validated()
    }

    /// Crypto context handed to the password hasher
    #[must_use]
    pub fn crypto_context(settings: &PasswordSettings) -> CryptoContext {
        CryptoContext {
            pepper: settings.pepper.as_bytes().to_vec(),
            memory_kib: settings.memory_kib,
            iterations: settings.iterations,
            parallelism: settings.parallelism,
        }
    }

    /// Create the Argon2id hasher
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidHasher` for rejected cost
    /// parameters or pepper.
    pub fn create_hasher(
        settings: &PasswordSettings,
    ) -> Result<Argon2PasswordHasher, ConfigurationError> {
        Argon2PasswordHasher::new(Self::crypto_context(settings))
    }

    /// Load the user tables named by the settings
    ///
    /// # Errors
    ///
    /// Returns an error if the users file cannot be read or parsed.
    pub fn load_user_store(settings: &RemembrsSettings) -> anyhow::Result<MemoryUserStore> {
        MemoryUserStore::from_file(Path::new(&settings.users.file))
    }
}
