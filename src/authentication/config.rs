//! Remember-me authenticator configuration
//!
//! `AuthConfig` is validated once at construction and is read-only afterwards,
//! so a single instance can be shared by every request.

use crate::models::ConfigurationError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_COOKIE_NAME: &str = "RememberMe";
pub const DEFAULT_COOKIE_EXPIRES: &str = "+2 weeks";
pub const DEFAULT_USER_MODEL: &str = "Users";

/// Cookie encryption scheme, passed through to the cookie store untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Crypt {
    #[default]
    Aes,
    None,
}

impl std::str::FromStr for Crypt {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes" => Ok(Crypt::Aes),
            "none" | "" => Ok(Crypt::None),
            other => Err(ConfigurationError::UnsupportedCrypt(other.to_string())),
        }
    }
}

/// Settings of the remember-me cookie itself
#[derive(Debug, Clone, PartialEq)]
pub struct CookieConfig {
    pub name: String,
    pub expires: Duration,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
    pub crypt: Crypt,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            expires: Duration::weeks(2),
            secure: true,
            http_only: true,
            path: "/".to_string(),
            crypt: Crypt::Aes,
        }
    }
}

/// Which payload/record fields carry the identifier and the secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    username: String,
    password: String,
}

impl FieldMap {
    /// # Errors
    ///
    /// Returns an error when either field name is empty or both are the same.
    pub fn new(username: &str, password: &str) -> Result<Self, ConfigurationError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() {
            return Err(ConfigurationError::MissingOption("fields.username"));
        }
        if password.is_empty() {
            return Err(ConfigurationError::MissingOption("fields.password"));
        }
        if username == password {
            return Err(ConfigurationError::ConflictingFields(username.to_string()));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            username: "username".to_string(),
            password: "password".to_string(),
        }
    }
}

/// One `field = value` restriction applied to every lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeConstraint {
    pub field: String,
    pub value: Value,
}

impl ScopeConstraint {
    pub fn new(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Immutable configuration of a `CookieAuthenticator`
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    pub cookie: CookieConfig,
    pub fields: FieldMap,
    pub user_model: String,
    pub scope: Vec<ScopeConstraint>,
    pub contain: Vec<String>,
    pub token_created: Option<String>,
    /// Staleness window for `token_created`; falls back to `cookie.expires`
    pub token_max_age: Option<Duration>,
    pub password_required: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie: CookieConfig::default(),
            fields: FieldMap::default(),
            user_model: DEFAULT_USER_MODEL.to_string(),
            scope: Vec::new(),
            contain: Vec::new(),
            token_created: None,
            token_max_age: None,
            password_required: true,
        }
    }
}

impl AuthConfig {
    /// Validate the configuration and normalise model-qualified field names
    ///
    /// `Users.active` becomes `active` when the user model is `Users` (or
    /// `Plugin.Users`). Constraints on other models are left untouched.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for an empty cookie name, an empty user
    /// model, an empty `token_created` field name or a non-positive duration.
    pub fn validated(mut self) -> Result<Self, ConfigurationError> {
        if self.cookie.name.trim().is_empty() {
            return Err(ConfigurationError::MissingOption("cookie.name"));
        }
        if self.user_model.trim().is_empty() {
            return Err(ConfigurationError::MissingOption("userModel"));
        }
        if self.cookie.expires <= Duration::zero() {
            return Err(ConfigurationError::InvalidDuration {
                option: "cookie.expires",
                value: format!("{}s", self.cookie.expires.num_seconds()),
            });
        }
        if let Some(max_age) = self.token_max_age {
            if max_age <= Duration::zero() {
                return Err(ConfigurationError::InvalidDuration {
                    option: "tokenMaxAge",
                    value: format!("{}s", max_age.num_seconds()),
                });
            }
        }
        if let Some(field) = &self.token_created {
            if field.trim().is_empty() {
                return Err(ConfigurationError::MissingOption("tokenCreated"));
            }
        }

        let prefix = format!("{}.", self.model_alias());
        for constraint in &mut self.scope {
            if let Some(bare) = constraint.field.strip_prefix(&prefix) {
                constraint.field = bare.to_string();
            }
        }
        self.contain.retain(|hint| !hint.trim().is_empty());

        for field in self.foreign_scope_fields() {
            log::warn!(
                "Scope field '{field}' names a model other than '{}'; no {} record can match it",
                self.user_model,
                self.model_alias()
            );
        }

        if self.token_created.is_some() && self.token_max_age.is_none() {
            log::warn!(
                "Token staleness window for cookie '{}' reuses the cookie lifetime ({}s); set token_max_age to decouple them",
                self.cookie.name,
                self.cookie.expires.num_seconds()
            );
        }

        Ok(self)
    }

    /// The user model without any plugin prefix (`Plugin.Users` -> `Users`)
    #[must_use]
    pub fn model_alias(&self) -> &str {
        self.user_model
            .rsplit_once('.')
            .map_or(self.user_model.as_str(), |(_, alias)| alias)
    }

    /// Scope fields still qualified with another model after normalisation
    #[must_use]
    pub fn foreign_scope_fields(&self) -> Vec<&str> {
        self.scope
            .iter()
            .map(|constraint| constraint.field.as_str())
            .filter(|field| field.contains('.'))
            .collect()
    }

    /// How old a token may be before the cookie is considered stale
    #[must_use]
    pub fn expiration_window(&self) -> Duration {
        self.token_max_age.unwrap_or(self.cookie.expires)
    }
}

/// Parse a relative duration such as `+2 weeks`, `14 days` or `1 week 2 days`
///
/// Months count as 30 days and years as 365 days.
///
/// # Errors
///
/// Returns `ConfigurationError::InvalidDuration` when the string is empty,
/// contains an unknown unit, a dangling number, or adds up to zero.
pub fn parse_relative_duration(
    option: &'static str,
    value: &str,
) -> Result<Duration, ConfigurationError> {
    let invalid = || ConfigurationError::InvalidDuration {
        option,
        value: value.to_string(),
    };

    let trimmed = value.trim().trim_start_matches('+').trim();
    let mut tokens = trimmed.split_whitespace();
    let mut total = Duration::zero();
    let mut parsed_any = false;

    while let Some(amount) = tokens.next() {
        let amount: i64 = amount.parse().map_err(|_| invalid())?;
        let unit = tokens.next().ok_or_else(invalid)?;
        let part = match unit.to_ascii_lowercase().trim_end_matches('s') {
            "sec" | "second" => Duration::try_seconds(amount),
            "min" | "minute" => Duration::try_minutes(amount),
            "hour" => Duration::try_hours(amount),
            "day" => Duration::try_days(amount),
            "week" => Duration::try_weeks(amount),
            "month" => amount.checked_mul(30).and_then(Duration::try_days),
            "year" => amount.checked_mul(365).and_then(Duration::try_days),
            _ => None,
        }
        .ok_or_else(invalid)?;
        total = total.checked_add(&part).ok_or_else(invalid)?;
        parsed_any = true;
    }

    if !parsed_any || total <= Duration::zero() {
        return Err(invalid());
    }
    Ok(total)
}
