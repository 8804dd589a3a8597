use crate::authentication::config::{
    ScopeConstraint, DEFAULT_COOKIE_EXPIRES, DEFAULT_COOKIE_NAME, DEFAULT_USER_MODEL,
};
use crate::utils::crypto::generate_secret;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RemembrsSettings {
    pub application: ApplicationSettings,
    pub cookie: CookieSettings,
    pub authenticator: AuthenticatorSettings,
    pub session: SessionSettings,
    pub password: PasswordSettings,
    pub users: UsersSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

/// Remember-me cookie transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub name: String,
    /// Relative lifetime such as `+2 weeks`
    pub expires: String,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
    /// Cookie encryption: `aes` or `none`
    pub crypt: String,
}

/// Field mapping and lookup settings for the cookie authenticator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticatorSettings {
    pub username_field: String,
    pub password_field: String,
    pub user_model: String,
    pub scope: Vec<ScopeConstraint>,
    pub contain: Vec<String>,
    /// Record field holding the token creation time; enables staleness checks
    pub token_created: Option<String>,
    /// Staleness window such as `+7 days`; defaults to the cookie lifetime
    pub token_max_age: Option<String>,
    pub password_required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Key the authenticated principal is stored under
    pub session_key: String,
    /// Secret used to encrypt the remember-me and session cookies
    pub session_secret: String,
    pub session_duration_hours: u64,
}

/// Argon2id crypto context for the password hasher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    pub pepper: String,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersSettings {
    /// JSON file with user tables keyed by model name
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            expires: DEFAULT_COOKIE_EXPIRES.to_string(),
            secure: true, // Default to secure cookies
            http_only: true,
            path: "/".to_string(),
            crypt: "aes".to_string(),
        }
    }
}

impl Default for AuthenticatorSettings {
    fn default() -> Self {
        Self {
            username_field: "username".to_string(),
            password_field: "password".to_string(),
            user_model: DEFAULT_USER_MODEL.to_string(),
            scope: Vec::new(),
            contain: Vec::new(),
            token_created: None,
            token_max_age: None,
            password_required: true,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_key: "Auth.User".to_string(),
            session_secret: String::new(), // Will be generated if empty
            session_duration_hours: 24,
        }
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            pepper: String::new(),
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl Default for UsersSettings {
    fn default() -> Self {
        Self {
            file: "users.json".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RemembrsSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    /// - Logger initialization fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging)?;
        Ok(settings)
    }

    /// Initialize `env_logger` with the configured level as default filter
    ///
    /// # Errors
    ///
    /// Returns an error if a logger was already installed
    fn initialize_logging(logging: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(logging.level.as_str()),
        )
        .try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `REMEMBRS_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml(&fs::read_to_string(&default_config_path)?)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("REMEMBRS_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_toml(&fs::read_to_string(&secrets_path)?)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ REMEMBRS_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse settings from a TOML document; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid settings TOML
    pub fn from_toml(toml_content: &str) -> Result<Self, basic_toml::Error> {
        basic_toml::from_str(toml_content)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_cookie_env_overrides(&mut settings.cookie);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_password_env_overrides(&mut settings.password);
        if let Ok(users_file) = std::env::var("USERS_FILE") {
            settings.users.file = users_file;
        }
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            settings.logging.level = log_level;
        }
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(name) = std::env::var("COOKIE_NAME") {
            cookie_settings.name = name;
        }
        if let Ok(expires) = std::env::var("COOKIE_EXPIRES") {
            cookie_settings.expires = expires;
        }
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(value) = std::env::var("SESSION_DURATION_HOURS") {
            if let Ok(hours) = value.parse::<u64>() {
                session_settings.session_duration_hours = hours;
            }
        }

        let env_secret_set = std::env::var("SESSION_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                session_settings.session_secret = secret;
                true
            }
        });

        // Generate random session secret if no environment variable was set and current value is empty
        if !env_secret_set && session_settings.session_secret.is_empty() {
            session_settings.session_secret = generate_secret(32);
            Self::warn_about_generated_secret();
        }
    }

    fn apply_password_env_overrides(password_settings: &mut PasswordSettings) {
        if let Ok(pepper) = std::env::var("PASSWORD_PEPPER") {
            password_settings.pepper = pepper;
        }
    }

    fn warn_about_generated_secret() {
        eprintln!("⚠️  WARNING: Using auto-generated session secret");
        eprintln!("🔒 For production use, set the SESSION_SECRET environment variable");
        eprintln!("   or configure session_secret in Settings.toml");
        eprintln!("💡 Remember-me cookies issued under another secret will no longer decrypt");
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if line.trim_start().starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}
