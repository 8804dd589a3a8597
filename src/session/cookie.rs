use actix_web::{cookie::Cookie, HttpRequest};
use std::collections::HashMap;

use crate::authentication::config::{CookieConfig, Crypt};
use crate::authentication::traits::CookieStore;
use crate::models::CookiePayload;
use crate::utils::crypto::decrypt_data;

/// Name of the stateless session cookie written by `CookieSessionStore`
pub const SESSION_COOKIE_NAME: &str = "remembrs_session";

/// Options for cookie creation
#[derive(Debug, Clone, PartialEq)]
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: actix_web::cookie::SameSite,
    pub path: String,
    pub max_age: chrono::Duration,
    pub crypt: Crypt,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: actix_web::cookie::SameSite::Lax,
            path: "/".to_string(),
            max_age: chrono::Duration::hours(24),
            crypt: Crypt::Aes,
        }
    }
}

impl From<&CookieConfig> for CookieOptions {
    fn from(config: &CookieConfig) -> Self {
        Self {
            http_only: config.http_only,
            secure: config.secure,
            path: config.path.clone(),
            max_age: config.expires,
            crypt: config.crypt,
            ..Default::default()
        }
    }
}

/// Request-scoped cookie store over an actix-web request
///
/// Reads come from the incoming request. Deletions are queued as expired
/// cookies and must be attached to the response with
/// [`RequestCookieJar::take_response_cookies`].
pub struct RequestCookieJar {
    req: HttpRequest,
    encryption_key: [u8; 32],
    options: HashMap<String, CookieOptions>,
    removed: Vec<String>,
    response_cookies: Vec<Cookie<'static>>,
}

impl RequestCookieJar {
    #[must_use]
    pub fn new(req: &HttpRequest, encryption_key: [u8; 32]) -> Self {
        Self {
            req: req.clone(),
            encryption_key,
            options: HashMap::new(),
            removed: Vec::new(),
            response_cookies: Vec::new(),
        }
    }

    /// Options registered for `name`, or the defaults
    #[must_use]
    pub fn options_for(&self, name: &str) -> CookieOptions {
        self.options.get(name).cloned().unwrap_or_default()
    }

    /// Drain the cookies queued for the response
    pub fn take_response_cookies(&mut self) -> Vec<Cookie<'static>> {
        std::mem::take(&mut self.response_cookies)
    }

    fn decode(&self, name: &str, raw: &str, crypt: Crypt) -> Option<CookiePayload> {
        let decoded = match crypt {
            Crypt::Aes => decrypt_data::<CookiePayload>(raw, &self.encryption_key),
            Crypt::None => serde_json::from_str::<CookiePayload>(raw).map_err(Into::into),
        };
        match decoded {
            Ok(payload) => Some(payload),
            Err(e) => {
                log::warn!("Ignoring unreadable cookie '{name}': {e}");
                None
            }
        }
    }
}

impl CookieStore for RequestCookieJar {
    fn configure(&mut self, name: &str, options: CookieOptions) {
        self.options.insert(name.to_string(), options);
    }

    fn read(&self, name: &str) -> Option<CookiePayload> {
        if self.removed.iter().any(|removed| removed == name) {
            return None;
        }
        let cookie = self.req.cookie(name)?;
        if cookie.value().is_empty() {
            return None;
        }
        let options = self.options_for(name);
        self.decode(name, cookie.value(), options.crypt)
            .filter(|payload| !payload.is_empty())
    }

    fn delete(&mut self, name: &str) {
        let options = self.options_for(name);
        self.response_cookies
            .retain(|cookie| cookie.name() != name);
        self.response_cookies
            .push(create_expired_cookie(name, &options));
        if !self.removed.iter().any(|removed| removed == name) {
            self.removed.push(name.to_string());
        }
        log::debug!("Queued removal of cookie '{name}'");
    }
}

/// Build a cookie from a value and options
#[must_use]
pub fn build_cookie(name: &str, value: String, options: &CookieOptions) -> Cookie<'static> {
    Cookie::build(name.to_owned(), value)
        .http_only(options.http_only)
        .secure(options.secure)
        .same_site(options.same_site)
        .path(options.path.clone())
        .max_age(actix_web::cookie::time::Duration::seconds(
            options.max_age.num_seconds(),
        ))
        .finish()
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, options: &CookieOptions) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(options.http_only)
        .secure(options.secure)
        .same_site(options.same_site)
        .path(options.path.clone())
        .max_age(actix_web::cookie::time::Duration::seconds(-1))
        .finish()
}
