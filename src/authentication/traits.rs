//! Authenticator capability and collaborator traits
//!
//! The authenticator owns no I/O of its own. Cookie transport, user lookup,
//! session persistence, hashing and time all come in through these traits so
//! the core can be driven by actix-web in production and by in-memory fakes in
//! tests.

use crate::models::{AuthenticationError, CookiePayload, Principal};
use crate::session::cookie::CookieOptions;
use crate::store::Predicate;
use chrono::{DateTime, Utc};

/// Client-side cookie access for one request
pub trait CookieStore {
    /// Register transport options (lifetime, encryption, flags) for a cookie
    fn configure(&mut self, name: &str, options: CookieOptions);

    /// Read and decode a cookie; `None` when absent, empty or undecodable
    fn read(&self, name: &str) -> Option<CookiePayload>;

    /// Remove a cookie from the client. Deleting an absent cookie is a no-op.
    fn delete(&mut self, name: &str);
}

/// Persistent user records
pub trait UserStore {
    /// Return the first record of `model` matching every predicate condition
    ///
    /// `contain` names related data the store should attach to the record.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot complete the query. No match is
    /// `Ok(None)`, not an error.
    fn find_one(
        &self,
        model: &str,
        predicate: &Predicate,
        contain: &[String],
    ) -> anyhow::Result<Option<Principal>>;
}

/// Server-side session for one request
pub trait SessionStore {
    /// Store the authenticated principal under `key`
    ///
    /// # Errors
    ///
    /// Returns an error when the session backend rejects the write.
    fn write(&mut self, key: &str, principal: &Principal) -> anyhow::Result<()>;
}

/// Pluggable hashing scheme for passwords and remember-me tokens
pub trait PasswordHasher {
    /// Hash a plaintext secret for storage
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying algorithm fails.
    fn hash(&self, plain: &str) -> anyhow::Result<String>;

    /// Verify a plaintext secret against a stored hash
    fn check(&self, plain: &str, hash: &str) -> bool;

    /// Whether a verified hash was produced with outdated parameters
    fn needs_rehash(&self, hash: &str) -> bool;
}

/// Current time source
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `Utc::now`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Per-request collaborators handed to the authenticator by the framework
pub struct RequestContext<'a> {
    /// Cookie access; `None` means the framework was wired without one
    pub cookies: Option<&'a mut dyn CookieStore>,
    pub session: &'a mut dyn SessionStore,
    /// Session key the principal is written under on success
    pub session_key: &'a str,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        cookies: &'a mut dyn CookieStore,
        session: &'a mut dyn SessionStore,
        session_key: &'a str,
    ) -> Self {
        Self {
            cookies: Some(cookies),
            session,
            session_key,
        }
    }
}

/// Capability interface implemented by every authentication adapter
pub trait Authenticator {
    /// Per-request entry point used by the orchestration framework
    ///
    /// # Returns
    /// * `Ok(Some(principal))` - the request was authenticated
    /// * `Ok(None)` - no user could be authenticated for this request
    ///
    /// # Errors
    /// Returns an error only for wiring faults or collaborator I/O failures,
    /// never for an ordinary authentication failure.
    fn authenticate(
        &self,
        ctx: &mut RequestContext<'_>,
    ) -> Result<Option<Principal>, AuthenticationError>;

    /// Resolve the user identified by the request, without a login form
    ///
    /// # Errors
    /// Same contract as [`Authenticator::authenticate`].
    fn get_user(
        &self,
        ctx: &mut RequestContext<'_>,
    ) -> Result<Option<Principal>, AuthenticationError>;

    /// Logout hook invoked by the framework when the session ends
    fn logout(&self, cookies: &mut dyn CookieStore, principal: Option<&Principal>);

    /// Name used for logging and identification
    fn service_name(&self) -> &'static str;
}
