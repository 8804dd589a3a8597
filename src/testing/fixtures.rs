//! Test fixtures providing pre-built test objects
//!
//! User tables mirror a small `MultiUsers` table of ordinary accounts and a
//! `CookieUsers` table holding one ephemeral remember-me token.

use crate::authentication::traits::PasswordHasher as _;
use crate::models::Principal;
use crate::settings::RemembrsSettings;
use crate::store::MemoryUserStore;
use crate::testing::mock::CountingUserStore;
use crate::utils::password::{Argon2PasswordHasher, CryptoContext};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::OnceLock;

use super::constants::{TEST_PASSWORD, TEST_PEPPER, TEST_SECRET, TOKEN_UUID, TOKEN_VALUE};

/// Cheap Argon2 costs so hashing stays fast in tests
const TEST_MEMORY_KIB: u32 = 1024;
const TEST_ITERATIONS: u32 = 1;

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Crypto context with the test pepper and cheap costs
    #[must_use]
    pub fn crypto_context() -> CryptoContext {
        CryptoContext {
            pepper: TEST_PEPPER.to_vec(),
            memory_kib: TEST_MEMORY_KIB,
            iterations: TEST_ITERATIONS,
            parallelism: 1,
        }
    }

    /// Hasher every fixture hash was produced with
    ///
    /// # Panics
    ///
    /// Panics if the test crypto context is rejected by Argon2.
    #[must_use]
    pub fn hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new(Self::crypto_context()).expect("valid test crypto context")
    }

    /// Same pepper, higher costs: verifies fixture hashes but flags them for rehash
    ///
    /// # Panics
    ///
    /// Panics if the crypto context is rejected by Argon2.
    #[must_use]
    pub fn stronger_hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new(CryptoContext {
            memory_kib: TEST_MEMORY_KIB * 2,
            iterations: TEST_ITERATIONS + 1,
            ..Self::crypto_context()
        })
        .expect("valid test crypto context")
    }

    /// Fixed "current" instant used with `FixedClock`
    ///
    /// # Panics
    ///
    /// Never in practice; the date is a valid UTC instant.
    #[must_use]
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 6, 1, 16, 1, 3)
            .single()
            .expect("valid fixture instant")
    }

    /// Hash of [`TEST_PASSWORD`], computed once per test binary
    ///
    /// # Panics
    ///
    /// Panics if hashing fails.
    #[must_use]
    pub fn password_hash() -> &'static str {
        static HASH: OnceLock<String> = OnceLock::new();
        HASH.get_or_init(|| Self::hasher().hash(TEST_PASSWORD).expect("hash test password"))
    }

    /// Hash of [`TOKEN_VALUE`], computed once per test binary
    ///
    /// # Panics
    ///
    /// Panics if hashing fails.
    #[must_use]
    pub fn token_hash() -> &'static str {
        static HASH: OnceLock<String> = OnceLock::new();
        HASH.get_or_init(|| Self::hasher().hash(TOKEN_VALUE).expect("hash test token"))
    }

    /// The `MultiUsers` table: five accounts sharing [`TEST_PASSWORD`]
    #[must_use]
    pub fn multi_users() -> Vec<Principal> {
        [
            (1, "mariano", "12345", "2007-03-17 01:16:23", "2007-03-17 01:18:31"),
            (2, "nate", "23456", "2007-03-17 01:18:23", "2007-03-17 01:20:31"),
            (3, "larry", "34567", "2007-03-17 01:20:23", "2007-03-17 01:22:31"),
            (4, "garrett", "45678", "2007-03-17 01:22:23", "2007-03-17 01:24:31"),
            (5, "chartjes", "56789", "2007-03-17 01:24:23", "2007-03-17 01:26:31"),
        ]
        .into_iter()
        .map(|(id, user_name, token, created, updated)| {
            Self::record(json!({
                "id": id,
                "user_name": user_name,
                "email": format!("{user_name}@example.com"),
                "password": Self::password_hash(),
                "token": token,
                "created": created,
                "updated": updated,
            }))
        })
        .collect()
    }

    /// A `CookieUsers` record whose token was issued `age` before [`Self::now`]
    #[must_use]
    pub fn cookie_user(age: Duration) -> Principal {
        let created = (Self::now() - age).format("%Y-%m-%d %H:%M:%S").to_string();
        Self::record(json!({
            "id": 1,
            "uuid": TOKEN_UUID,
            "user_name": "mariano",
            "email": "mariano@example.com",
            "remember_me_token": Self::token_hash(),
            "remember_me_token_created": created,
            "profile": { "display_name": "Mariano" },
        }))
    }

    /// Both fixture tables, with a token issued one day ago
    #[must_use]
    pub fn user_store() -> MemoryUserStore {
        MemoryUserStore::new()
            .with_table("MultiUsers", Self::multi_users())
            .with_table("CookieUsers", vec![Self::cookie_user(Duration::days(1))])
    }

    /// Only the `CookieUsers` table, with a token of the given age
    #[must_use]
    pub fn user_store_with_token_age(age: Duration) -> MemoryUserStore {
        MemoryUserStore::new().with_table("CookieUsers", vec![Self::cookie_user(age)])
    }

    /// [`Self::user_store`] wrapped to count lookups
    #[must_use]
    pub fn counting_user_store() -> CountingUserStore {
        CountingUserStore::new(Self::user_store())
    }

    /// Settings pointing the authenticator at the `MultiUsers` table
    #[must_use]
    pub fn settings() -> RemembrsSettings {
        let mut settings = RemembrsSettings::default();
        settings.cookie.secure = false;
        settings.authenticator.username_field = "user_name".to_string();
        settings.authenticator.user_model = "MultiUsers".to_string();
        settings.session.session_secret = String::from_utf8_lossy(TEST_SECRET).into_owned();
        settings.password.pepper = String::from_utf8_lossy(TEST_PEPPER).into_owned();
        settings.password.memory_kib = TEST_MEMORY_KIB;
        settings.password.iterations = TEST_ITERATIONS;
        settings.password.parallelism = 1;
        settings
    }

    /// Settings for ephemeral tokens against the `CookieUsers` table
    #[must_use]
    pub fn token_settings() -> RemembrsSettings {
        let mut settings = Self::settings();
        settings.authenticator.username_field = "uuid".to_string();
        settings.authenticator.password_field = "remember_me_token".to_string();
        settings.authenticator.user_model = "CookieUsers".to_string();
        settings.authenticator.token_created = Some("remember_me_token_created".to_string());
        settings
    }

    fn record(value: Value) -> Principal {
        serde_json::from_value(value).expect("fixture records are JSON objects")
    }
}
