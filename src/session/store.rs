//! Stateless session store backed by an encrypted cookie

use crate::authentication::traits::SessionStore;
use crate::models::Principal;
use crate::session::cookie::{build_cookie, create_expired_cookie, CookieOptions, SESSION_COOKIE_NAME};
use crate::utils::crypto::{decrypt_data, encrypt_data};
use actix_web::{cookie::Cookie, HttpRequest};
use anyhow::Result;
use std::collections::BTreeMap;

/// Keeps the session map in a single AES-256-GCM encrypted cookie
///
/// Existing session entries are read from the request on construction so a
/// write only replaces its own key.
pub struct CookieSessionStore {
    encryption_key: [u8; 32],
    options: CookieOptions,
    entries: BTreeMap<String, Principal>,
    dirty: bool,
}

impl CookieSessionStore {
    #[must_use]
    pub fn new(encryption_key: [u8; 32], options: CookieOptions) -> Self {
        Self {
            encryption_key,
            options,
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Start from the session carried by the request, if it can be decrypted
    #[must_use]
    pub fn from_request(req: &HttpRequest, encryption_key: [u8; 32], options: CookieOptions) -> Self {
        let mut store = Self::new(encryption_key, options);
        if let Some(cookie) = req.cookie(SESSION_COOKIE_NAME) {
            match decrypt_data::<BTreeMap<String, Principal>>(cookie.value(), &encryption_key) {
                Ok(entries) => store.entries = entries,
                Err(e) => log::warn!("Discarding unreadable session cookie: {e}"),
            }
        }
        store
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Principal> {
        self.entries.get(key)
    }

    /// The session cookie to attach to the response, if anything changed
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn to_cookie(&self) -> Result<Option<Cookie<'static>>> {
        if !self.dirty {
            return Ok(None);
        }
        let value = encrypt_data(&self.entries, &self.encryption_key)?;
        Ok(Some(build_cookie(SESSION_COOKIE_NAME, value, &self.options)))
    }

    /// Expired session cookie used on logout
    #[must_use]
    pub fn expired_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(SESSION_COOKIE_NAME, &self.options)
    }
}

impl SessionStore for CookieSessionStore {
    fn write(&mut self, key: &str, principal: &Principal) -> Result<()> {
        self.entries.insert(key.to_string(), principal.clone());
        self.dirty = true;
        Ok(())
    }
}
