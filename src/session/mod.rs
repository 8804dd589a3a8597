//! Cookie and session collaborators for actix-web
//!
//! # Modules
//!
//! - [`cookie`] - Request-scoped cookie jar with AES-GCM decryption
//! - [`store`] - Stateless session store kept in an encrypted cookie

pub mod cookie;
pub mod store;

pub use cookie::{
    build_cookie, create_expired_cookie, CookieOptions, RequestCookieJar, SESSION_COOKIE_NAME,
};
pub use store::CookieSessionStore;
