use crate::models::HealthResponse;
use actix_web::{HttpResponse, Result};

/// Liveness probe
///
/// # Errors
/// Never fails; the `Result` matches the other handlers' signatures
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "pong".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
