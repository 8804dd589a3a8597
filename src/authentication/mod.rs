//! Remember-me authentication
//!
//! This module provides the cookie authenticator, its configuration, the
//! collaborator traits it is driven through, and the factory that builds it
//! from settings.

pub mod config;
pub mod cookie_authenticator;
pub mod factory;
pub mod traits;

pub use config::{AuthConfig, CookieConfig, Crypt, FieldMap, ScopeConstraint};
pub use cookie_authenticator::{CookieAuthenticator, RememberedUser};
pub use factory::{AuthenticationConfig, AuthenticatorFactory};
pub use traits::{
    Authenticator, Clock, CookieStore, PasswordHasher, RequestContext, SessionStore,
    SystemClock, UserStore,
};
