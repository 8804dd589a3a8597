//! Mock objects and fake implementations for testing
//!
//! In-memory stand-ins for the authenticator's collaborators, so the core can
//! be exercised without an HTTP request.

use crate::authentication::traits::{Clock, CookieStore, SessionStore, UserStore};
use crate::models::{CookiePayload, Principal};
use crate::session::cookie::CookieOptions;
use crate::store::{MemoryUserStore, Predicate};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Cookie store holding already-decoded payloads
#[derive(Debug, Default)]
pub struct MockCookieStore {
    cookies: HashMap<String, CookiePayload>,
    configured: HashMap<String, CookieOptions>,
    deletions: usize,
}

impl MockCookieStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a cookie with the given fields, replacing any previous value
    pub fn set(&mut self, name: &str, fields: &[(&str, &str)]) {
        let payload = fields
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        self.cookies.insert(name.to_string(), payload);
    }

    /// Options registered for `name` through [`CookieStore::configure`]
    #[must_use]
    pub fn configured(&self, name: &str) -> Option<&CookieOptions> {
        self.configured.get(name)
    }

    /// Number of delete calls received
    #[must_use]
    pub fn deletions(&self) -> usize {
        self.deletions
    }
}

impl CookieStore for MockCookieStore {
    fn configure(&mut self, name: &str, options: CookieOptions) {
        self.configured.insert(name.to_string(), options);
    }

    fn read(&self, name: &str) -> Option<CookiePayload> {
        self.cookies.get(name).cloned()
    }

    fn delete(&mut self, name: &str) {
        self.cookies.remove(name);
        self.deletions += 1;
    }
}

/// Shared view of a [`CountingUserStore`]'s lookup count
#[derive(Debug, Clone, Default)]
pub struct LookupCounter(Arc<AtomicUsize>);

impl LookupCounter {
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// User store that counts the queries it receives
#[derive(Debug, Default)]
pub struct CountingUserStore {
    inner: MemoryUserStore,
    lookups: LookupCounter,
}

impl CountingUserStore {
    #[must_use]
    pub fn new(inner: MemoryUserStore) -> Self {
        Self {
            inner,
            lookups: LookupCounter::default(),
        }
    }

    /// Counter handle that stays valid after the store is moved into an `Arc`
    #[must_use]
    pub fn lookups(&self) -> LookupCounter {
        self.lookups.clone()
    }
}

impl UserStore for CountingUserStore {
    fn find_one(
        &self,
        model: &str,
        predicate: &Predicate,
        contain: &[String],
    ) -> anyhow::Result<Option<Principal>> {
        self.lookups.0.fetch_add(1, Ordering::SeqCst);
        self.inner.find_one(model, predicate, contain)
    }
}

/// Session store whose writes always fail
#[derive(Debug, Default)]
pub struct FailingSessionStore;

impl SessionStore for FailingSessionStore {
    fn write(&mut self, key: &str, _principal: &Principal) -> anyhow::Result<()> {
        Err(anyhow!("session backend unavailable while writing '{key}'"))
    }
}
