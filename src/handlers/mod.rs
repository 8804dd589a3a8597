// HTTP request handlers for remember-me re-authentication
pub mod auth;
pub mod health;

use actix_web::web;

// Re-export the main handler functions
pub use auth::{remember_me_login, remember_me_logout};
pub use health::health;

/// Register every route served by the application
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Remember-me endpoints
        .route("/auth/remember", web::get().to(remember_me_login))
        .route("/auth/logout", web::get().to(remember_me_logout))
        .route("/auth/logout", web::post().to(remember_me_logout))
        // Health endpoint
        .route("/ping", web::get().to(health));
}
