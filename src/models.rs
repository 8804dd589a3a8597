use serde::{Deserialize, Serialize};

pub mod auth;
pub mod principal;

pub use auth::{AuthenticationError, ConfigurationError};
pub use principal::{CookiePayload, Principal};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
