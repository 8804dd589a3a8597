// Remember-me handlers: cookie login and logout
use crate::authentication::{
    AuthenticationConfig, Authenticator, CookieAuthenticator, RequestContext,
};
use crate::session::{CookieSessionStore, RequestCookieJar};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{debug, error, info};
use serde_json::json;

/// Re-authenticate the client from its remember-me cookie
///
/// On success the principal is written to the encrypted session cookie and
/// returned as JSON. A request that cannot be authenticated gets `401`;
/// wiring faults and store failures get `500`.
///
/// # Errors
/// Never returns `Err`; failures are mapped to HTTP responses
pub async fn remember_me_login(
    req: HttpRequest,
    authenticator: web::Data<CookieAuthenticator>,
    auth_config: web::Data<AuthenticationConfig>,
) -> Result<HttpResponse> {
    let mut cookies = RequestCookieJar::new(&req, auth_config.encryption_key);
    let mut session = CookieSessionStore::from_request(
        &req,
        auth_config.encryption_key,
        auth_config.session_cookie_options(),
    );

    let result = {
        let mut ctx = RequestContext::new(&mut cookies, &mut session, &auth_config.session_key);
        authenticator.authenticate_remembered(&mut ctx)
    };

    match result {
        Ok(Some(user)) => {
            let session_cookie = match session.to_cookie() {
                Ok(cookie) => cookie,
                Err(e) => {
                    error!("Failed to encrypt session cookie: {e}");
                    return Ok(internal_error());
                }
            };
            if user.needs_rehash {
                info!("Stored remember-me hash uses outdated parameters; rehash on next login");
            }

            let mut builder = HttpResponse::Ok();
            if let Some(cookie) = session_cookie {
                builder.cookie(cookie);
            }
            for cookie in cookies.take_response_cookies() {
                builder.cookie(cookie);
            }
            Ok(builder.json(user.principal))
        }
        Ok(None) => {
            debug!("No user could be re-authenticated from the remember-me cookie");
            Ok(HttpResponse::Unauthorized().json(json!({
                "error": "unauthorized",
                "message": "No valid remember-me cookie"
            })))
        }
        Err(e) if e.is_configuration() => {
            error!("Remember-me authenticator is misconfigured: {e}");
            Ok(internal_error())
        }
        Err(e) => {
            error!("Remember-me authentication failed: {e}");
            Ok(internal_error())
        }
    }
}

/// Clear the remember-me cookie and the session cookie
///
/// # Errors
/// Never returns `Err`; logout always succeeds
pub async fn remember_me_logout(
    req: HttpRequest,
    authenticator: web::Data<CookieAuthenticator>,
    auth_config: web::Data<AuthenticationConfig>,
) -> Result<HttpResponse> {
    let mut cookies = RequestCookieJar::new(&req, auth_config.encryption_key);
    let session = CookieSessionStore::from_request(
        &req,
        auth_config.encryption_key,
        auth_config.session_cookie_options(),
    );

    let principal = session.get(&auth_config.session_key);
    authenticator.logout(&mut cookies, principal);
    info!(
        "Logged out via {} authenticator (session present: {})",
        authenticator.service_name(),
        principal.is_some()
    );

    let mut builder = HttpResponse::Ok();
    for cookie in cookies.take_response_cookies() {
        builder.cookie(cookie);
    }
    builder.cookie(session.expired_cookie());
    Ok(builder.json(json!({
        "status": "ok",
        "message": "Signed out"
    })))
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "error": "internal_error",
        "message": "Authentication is unavailable"
    }))
}
