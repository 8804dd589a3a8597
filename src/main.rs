#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use remembrs::{
    authentication::{AuthenticationConfig, AuthenticatorFactory},
    handlers::configure_services,
    settings::RemembrsSettings,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = RemembrsSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let users = AuthenticatorFactory::load_user_store(&settings)
        .map_err(|e| std::io::Error::other(format!("Failed to load users: {e:#}")))?;

    println!("✓ Using stateless sessions with encrypted cookies");
    start_server(settings, users).await
}

/// Start the server with stateless sessions
///
/// # Errors
///
/// Returns an error if:
/// - The authenticator configuration is invalid
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    settings: RemembrsSettings,
    users: remembrs::store::MemoryUserStore,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let auth_config = web::Data::new(AuthenticationConfig::from_settings(&settings));
    let authenticator = web::Data::new(
        AuthenticatorFactory::create_authenticator(&settings, Arc::new(users))
            .map_err(|e| std::io::Error::other(format!("Invalid authenticator settings: {e}")))?,
    );

    HttpServer::new(move || {
        App::new()
            .app_data(authenticator.clone())
            .app_data(auth_config.clone())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &RemembrsSettings) {
    println!(
        "Starting Remembrs {} on http://{bind_address}",
        remembrs::VERSION
    );
    println!("Remember-me cookie: {}", settings.cookie.name);
    println!("User model: {}", settings.authenticator.user_model);
    println!("Users file: {}", settings.users.file);
    println!();
    println!("Remember-me endpoints:");
    println!("  GET  /auth/remember     - Re-authenticate from the remember-me cookie");
    println!("  GET|POST /auth/logout   - Clear remember-me and session cookies");
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
}
