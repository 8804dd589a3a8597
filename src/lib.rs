#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the remembrs application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod handlers;
pub mod models;
pub mod session;
pub mod settings;
pub mod store;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::{
    AuthConfig, AuthenticationConfig, Authenticator, AuthenticatorFactory, CookieAuthenticator,
};
pub use handlers::{configure_services, health, remember_me_login, remember_me_logout};
pub use models::{AuthenticationError, ConfigurationError, Principal};
pub use settings::RemembrsSettings;
