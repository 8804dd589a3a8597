//! Remember-me cookie authenticator
//!
//! Re-establishes a session from a persistent cookie holding an identifier
//! and a secret. Every authentication failure (no cookie, missing fields, no
//! matching record, stale token, wrong secret) collapses into `Ok(None)`;
//! only wiring faults and collaborator I/O failures are errors.

use crate::authentication::config::AuthConfig;
use crate::authentication::traits::{
    Authenticator, Clock, CookieStore, PasswordHasher, RequestContext, SystemClock, UserStore,
};
use crate::models::{AuthenticationError, ConfigurationError, CookiePayload, Principal};
use crate::session::cookie::CookieOptions;
use crate::store::Predicate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A user re-authenticated from the remember-me cookie
#[derive(Debug, Clone, PartialEq)]
pub struct RememberedUser {
    pub principal: Principal,
    /// The verified hash was produced with outdated parameters
    pub needs_rehash: bool,
}

pub struct CookieAuthenticator {
    config: AuthConfig,
    users: Arc<dyn UserStore + Send + Sync>,
    hasher: Arc<dyn PasswordHasher + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    needs_rehash: AtomicBool,
}

impl CookieAuthenticator {
    /// Build an authenticator with the system clock
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the configuration does not validate.
    pub fn new(
        config: AuthConfig,
        users: Arc<dyn UserStore + Send + Sync>,
        hasher: Arc<dyn PasswordHasher + Send + Sync>,
    ) -> Result<Self, ConfigurationError> {
        Self::with_clock(config, users, hasher, Arc::new(SystemClock))
    }

    /// Build an authenticator with an explicit time source
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the configuration does not validate.
    pub fn with_clock(
        config: AuthConfig,
        users: Arc<dyn UserStore + Send + Sync>,
        hasher: Arc<dyn PasswordHasher + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            config: config.validated()?,
            users,
            hasher,
            clock,
            needs_rehash: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Whether the last `find_user_with_expiration` call verified a hash
    /// that should be regenerated
    ///
    /// Advisory only and shared by every caller of this authenticator. Use
    /// [`RememberedUser::needs_rehash`] when requests run concurrently.
    #[must_use]
    pub fn needs_password_rehash(&self) -> bool {
        self.needs_rehash.load(Ordering::Relaxed)
    }

    /// Look up the user named in the cookie, enforcing scope and token age
    ///
    /// When `password` is `None` secret verification is skipped. The secret
    /// field is removed from the returned record either way. The rehash
    /// advisory is reset on entry and set from this call's outcome only.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationError::UserStore` if the store lookup fails.
    pub fn find_user_with_expiration(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> Result<Option<Principal>, AuthenticationError> {
        self.needs_rehash.store(false, Ordering::Relaxed);
        let found = self.resolve_user(username, password)?;
        Ok(found.map(|user| {
            self.needs_rehash.store(user.needs_rehash, Ordering::Relaxed);
            user.principal
        }))
    }

    /// Run the full cookie flow and return the user with its own rehash advisory
    ///
    /// # Errors
    ///
    /// Same contract as [`Authenticator::authenticate`].
    pub fn authenticate_remembered(
        &self,
        ctx: &mut RequestContext<'_>,
    ) -> Result<Option<RememberedUser>, AuthenticationError> {
        let cookies = ctx
            .cookies
            .as_deref_mut()
            .ok_or(ConfigurationError::MissingCookieStore)?;

        let cookie_name = &self.config.cookie.name;
        cookies.configure(cookie_name, CookieOptions::from(&self.config.cookie));

        let Some(payload) = cookies.read(cookie_name).filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        let Some((username, password)) = self.credentials(&payload) else {
            log::debug!("Remember-me cookie '{cookie_name}' is missing a configured field");
            return Ok(None);
        };

        self.needs_rehash.store(false, Ordering::Relaxed);
        let Some(user) = self.resolve_user(username, password)? else {
            return Ok(None);
        };
        self.needs_rehash.store(user.needs_rehash, Ordering::Relaxed);

        ctx.session
            .write(ctx.session_key, &user.principal)
            .map_err(AuthenticationError::Session)?;
        log::info!("Re-authenticated {} from remember-me cookie", self.config.user_model);
        Ok(Some(user))
    }

    fn resolve_user(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> Result<Option<RememberedUser>, AuthenticationError> {
        let fields = &self.config.fields;
        let predicate = Predicate::new()
            .eq(fields.username(), username)
            .with_scope(&self.config.scope);

        let Some(mut record) = self
            .users
            .find_one(&self.config.user_model, &predicate, &self.config.contain)
            .map_err(AuthenticationError::UserStore)?
        else {
            log::debug!("No {} record matched the remember-me cookie", self.config.user_model);
            return Ok(None);
        };

        if let Some(token_field) = &self.config.token_created {
            if !self.token_is_fresh(&record, token_field) {
                return Ok(None);
            }
        }

        let mut needs_rehash = false;
        if let Some(password) = password {
            let Some(stored_hash) = record.get_str(fields.password()) else {
                log::debug!("Record has no stored hash in '{}'", fields.password());
                return Ok(None);
            };
            if !self.hasher.check(password, stored_hash) {
                log::debug!("Remember-me secret did not verify");
                return Ok(None);
            }
            needs_rehash = self.hasher.needs_rehash(stored_hash);
        }

        record.remove(fields.password());
        Ok(Some(RememberedUser {
            principal: record,
            needs_rehash,
        }))
    }

    fn token_is_fresh(&self, record: &Principal, token_field: &str) -> bool {
        let Some(created) = record.timestamp(token_field) else {
            log::debug!("Record has no readable token timestamp in '{token_field}'");
            return false;
        };
        let age = self.clock.now() - created;
        if age > self.config.expiration_window() {
            log::debug!(
                "Remember-me token is stale: {}s old, window {}s",
                age.num_seconds(),
                self.config.expiration_window().num_seconds()
            );
            return false;
        }
        true
    }

    /// Pull the identifier and secret out of the payload
    ///
    /// The secret is only required when password verification is enabled.
    fn credentials<'p>(&self, payload: &'p CookiePayload) -> Option<(&'p str, Option<&'p str>)> {
        let fields = &self.config.fields;
        let username = payload
            .get(fields.username())
            .map(String::as_str)
            .filter(|value| !value.is_empty())?;

        if !self.config.password_required {
            return Some((username, None));
        }
        let password = payload
            .get(fields.password())
            .map(String::as_str)
            .filter(|value| !value.is_empty())?;
        Some((username, Some(password)))
    }
}

impl Authenticator for CookieAuthenticator {
    fn authenticate(
        &self,
        ctx: &mut RequestContext<'_>,
    ) -> Result<Option<Principal>, AuthenticationError> {
        self.get_user(ctx)
    }

    fn get_user(
        &self,
        ctx: &mut RequestContext<'_>,
    ) -> Result<Option<Principal>, AuthenticationError> {
        Ok(self.authenticate_remembered(ctx)?.map(|user| user.principal))
    }

    fn logout(&self, cookies: &mut dyn CookieStore, _principal: Option<&Principal>) {
        let cookie_name = &self.config.cookie.name;
        cookies.configure(cookie_name, CookieOptions::from(&self.config.cookie));
        cookies.delete(cookie_name);
    }

    fn service_name(&self) -> &'static str {
        "cookie"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authentication::config::{FieldMap, ScopeConstraint};
    use crate::store::{MemorySessionStore, MemoryUserStore};
    use crate::testing::constants::{SESSION_KEY, TOKEN_UUID, TOKEN_VALUE};
    use crate::testing::mock::{FailingSessionStore, FixedClock, MockCookieStore};
    use crate::testing::TestFixtures;
    use chrono::Duration;
    use serde_json::json;

    fn multi_users_config() -> AuthConfig {
        AuthConfig {
            fields: FieldMap::new("user_name", "password").unwrap(),
            user_model: "MultiUsers".to_string(),
            ..Default::default()
        }
    }

    fn token_config() -> AuthConfig {
        AuthConfig {
            fields: FieldMap::new("uuid", "remember_me_token").unwrap(),
            user_model: "CookieUsers".to_string(),
            token_created: Some("remember_me_token_created".to_string()),
            ..Default::default()
        }
    }

    fn authenticator(config: AuthConfig, store: MemoryUserStore) -> CookieAuthenticator {
        CookieAuthenticator::with_clock(
            config,
            Arc::new(store),
            Arc::new(TestFixtures::hasher()),
            Arc::new(FixedClock::new(TestFixtures::now())),
        )
        .unwrap()
    }

    fn run(
        auth: &CookieAuthenticator,
        cookies: &mut MockCookieStore,
        session: &mut MemorySessionStore,
    ) -> Option<Principal> {
        let mut ctx = RequestContext::new(cookies, session, SESSION_KEY);
        auth.authenticate(&mut ctx).unwrap()
    }

    #[test]
    fn test_authenticate_username_and_password() {
        let auth = authenticator(multi_users_config(), TestFixtures::user_store());
        let mut cookies = MockCookieStore::new();
        let mut session = MemorySessionStore::new();

        assert!(run(&auth, &mut cookies, &mut session).is_none());
        assert!(session.is_empty());

        cookies.set("RememberMe", &[("user_name", "mariano"), ("password", "password")]);
        let user = run(&auth, &mut cookies, &mut session).unwrap();

        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            json!({
                "id": 1,
                "user_name": "mariano",
                "email": "mariano@example.com",
                "token": "12345",
                "created": "2007-03-17 01:16:23",
                "updated": "2007-03-17 01:18:31"
            })
        );
        assert_eq!(session.get(SESSION_KEY), Some(&user));
        // fixture hashes were made with the hasher's own params
        assert!(!auth.needs_password_rehash());
    }

    #[test]
    fn test_cookie_is_configured_before_read() {
        let auth = authenticator(multi_users_config(), TestFixtures::user_store());
        let mut cookies = MockCookieStore::new();
        let mut session = MemorySessionStore::new();

        run(&auth, &mut cookies, &mut session);
        let options = cookies.configured("RememberMe").unwrap();
        assert_eq!(options.max_age, Duration::weeks(2));
    }

    #[test]
    fn test_unknown_user_is_absent() {
        let auth = authenticator(multi_users_config(), TestFixtures::user_store());
        let mut cookies = MockCookieStore::new();
        let mut session = MemorySessionStore::new();

        cookies.set("RememberMe", &[("user_name", "nobody"), ("password", "password")]);
        assert!(run(&auth, &mut cookies, &mut session).is_none());
        assert!(session.is_empty());
    }

    #[test]
    fn test_wrong_password_is_absent() {
        let auth = authenticator(multi_users_config(), TestFixtures::user_store());
        let mut cookies = MockCookieStore::new();
        let mut session = MemorySessionStore::new();

        cookies.set("RememberMe", &[("user_name", "mariano"), ("password", "wrong")]);
        assert!(run(&auth, &mut cookies, &mut session).is_none());
        assert!(session.is_empty());
    }

    #[test]
    fn test_missing_or_empty_fields_skip_the_store() {
        let store = TestFixtures::counting_user_store();
        let lookups = store.lookups();
        let auth = CookieAuthenticator::with_clock(
            multi_users_config(),
            Arc::new(store),
            Arc::new(TestFixtures::hasher()),
            Arc::new(FixedClock::new(TestFixtures::now())),
        )
        .unwrap();
        let mut session = MemorySessionStore::new();

        let payloads: [&[(&str, &str)]; 4] = [
            &[("user_name", "mariano")],
            &[("password", "password")],
            &[("user_name", ""), ("password", "password")],
            &[("user_name", "mariano"), ("password", "")],
        ];
        for payload in payloads {
            let mut cookies = MockCookieStore::new();
            cookies.set("RememberMe", payload);
            assert!(run(&auth, &mut cookies, &mut session).is_none());
        }
        assert_eq!(lookups.get(), 0);
    }

    #[test]
    fn test_scope_excludes_matching_identifier() {
        let config = AuthConfig {
            scope: vec![ScopeConstraint::new("MultiUsers.token", "12345")],
            ..multi_users_config()
        };
        let auth = authenticator(config, TestFixtures::user_store());
        let mut session = MemorySessionStore::new();

        // nate exists but carries another token
        let mut cookies = MockCookieStore::new();
        cookies.set("RememberMe", &[("user_name", "nate"), ("password", "password")]);
        assert!(run(&auth, &mut cookies, &mut session).is_none());

        let mut cookies = MockCookieStore::new();
        cookies.set("RememberMe", &[("user_name", "mariano"), ("password", "password")]);
        assert!(run(&auth, &mut cookies, &mut session).is_some());
    }

    #[test]
    fn test_ephemeral_token_within_window() {
        let store = TestFixtures::user_store_with_token_age(Duration::days(1));
        let auth = authenticator(token_config(), store);
        let mut cookies = MockCookieStore::new();
        let mut session = MemorySessionStore::new();

        cookies.set("RememberMe", &[("uuid", TOKEN_UUID), ("remember_me_token", TOKEN_VALUE)]);
        let user = run(&auth, &mut cookies, &mut session).unwrap();

        assert_eq!(user.get_str("uuid"), Some(TOKEN_UUID));
        assert!(user.contains("remember_me_token_created"));
        assert!(!user.contains("remember_me_token"));
        assert_eq!(session.get(SESSION_KEY), Some(&user));
    }

    #[test]
    fn test_stale_token_is_absent() {
        let store = TestFixtures::user_store_with_token_age(Duration::days(40));
        let auth = authenticator(token_config(), store);
        let mut cookies = MockCookieStore::new();
        let mut session = MemorySessionStore::new();

        cookies.set("RememberMe", &[("uuid", TOKEN_UUID), ("remember_me_token", TOKEN_VALUE)]);
        assert!(run(&auth, &mut cookies, &mut session).is_none());
        assert!(session.is_empty());
    }

    #[test]
    fn test_expiration_boundary() {
        let epsilon = Duration::minutes(1);
        let mut session = MemorySessionStore::new();

        for (age, expected) in [
            (Duration::weeks(2) - epsilon, true),
            (Duration::weeks(2) + epsilon, false),
        ] {
            let auth = authenticator(token_config(), TestFixtures::user_store_with_token_age(age));
            let mut cookies = MockCookieStore::new();
            cookies.set("RememberMe", &[("uuid", TOKEN_UUID), ("remember_me_token", TOKEN_VALUE)]);
            assert_eq!(
                run(&auth, &mut cookies, &mut session).is_some(),
                expected,
                "token age {}s",
                age.num_seconds()
            );
        }
    }

    #[test]
    fn test_token_max_age_is_independent_of_cookie_expiry() {
        let config = AuthConfig {
            token_max_age: Some(Duration::hours(12)),
            ..token_config()
        };
        let auth = authenticator(config, TestFixtures::user_store_with_token_age(Duration::days(1)));
        let mut cookies = MockCookieStore::new();
        let mut session = MemorySessionStore::new();

        cookies.set("RememberMe", &[("uuid", TOKEN_UUID), ("remember_me_token", TOKEN_VALUE)]);
        assert!(run(&auth, &mut cookies, &mut session).is_none());
    }

    #[test]
    fn test_missing_token_timestamp_is_absent() {
        let mut record = TestFixtures::cookie_user(Duration::days(1));
        record.remove("remember_me_token_created");
        let store = MemoryUserStore::new().with_table("CookieUsers", vec![record]);
        let auth = authenticator(token_config(), store);

        let user = auth
            .find_user_with_expiration(TOKEN_UUID, Some(TOKEN_VALUE))
            .unwrap();
        assert!(user.is_none());
    }

    #[test]
    fn test_find_user_without_password_skips_verification() {
        let auth = authenticator(multi_users_config(), TestFixtures::user_store());

        let user = auth.find_user_with_expiration("mariano", None).unwrap().unwrap();
        assert_eq!(user.get_str("email"), Some("mariano@example.com"));
        assert!(!user.contains("password"));
    }

    #[test]
    fn test_identifier_only_cookie_when_password_not_required() {
        let config = AuthConfig {
            password_required: false,
            ..multi_users_config()
        };
        let auth = authenticator(config, TestFixtures::user_store());
        let mut cookies = MockCookieStore::new();
        let mut session = MemorySessionStore::new();

        cookies.set("RememberMe", &[("user_name", "larry")]);
        let user = run(&auth, &mut cookies, &mut session).unwrap();
        assert_eq!(user.get_str("user_name"), Some("larry"));
        assert!(!user.contains("password"));
    }

    #[test]
    fn test_rehash_flag_for_outdated_params() {
        let auth = CookieAuthenticator::with_clock(
            multi_users_config(),
            Arc::new(TestFixtures::user_store()),
            Arc::new(TestFixtures::stronger_hasher()),
            Arc::new(FixedClock::new(TestFixtures::now())),
        )
        .unwrap();

        let user = auth.find_user_with_expiration("mariano", Some("password")).unwrap();
        assert!(user.is_some());
        assert!(auth.needs_password_rehash());
    }

    #[test]
    fn test_rehash_flag_reflects_only_the_latest_lookup() {
        let auth = CookieAuthenticator::with_clock(
            multi_users_config(),
            Arc::new(TestFixtures::user_store()),
            Arc::new(TestFixtures::stronger_hasher()),
            Arc::new(FixedClock::new(TestFixtures::now())),
        )
        .unwrap();

        assert!(auth.find_user_with_expiration("mariano", Some("password")).unwrap().is_some());
        assert!(auth.needs_password_rehash());

        assert!(auth.find_user_with_expiration("nate", Some("wrong")).unwrap().is_none());
        assert!(!auth.needs_password_rehash());

        assert!(auth.find_user_with_expiration("mariano", Some("password")).unwrap().is_some());
        assert!(auth.find_user_with_expiration("larry", None).unwrap().is_some());
        assert!(!auth.needs_password_rehash());
    }

    #[test]
    fn test_remembered_user_carries_its_own_advisory() {
        let auth = CookieAuthenticator::with_clock(
            multi_users_config(),
            Arc::new(TestFixtures::user_store()),
            Arc::new(TestFixtures::stronger_hasher()),
            Arc::new(FixedClock::new(TestFixtures::now())),
        )
        .unwrap();
        let mut session = MemorySessionStore::new();

        let mut cookies = MockCookieStore::new();
        cookies.set("RememberMe", &[("user_name", "mariano"), ("password", "password")]);
        let mut ctx = RequestContext::new(&mut cookies, &mut session, SESSION_KEY);
        let user = auth.authenticate_remembered(&mut ctx).unwrap().unwrap();
        assert!(user.needs_rehash);
        assert_eq!(user.principal.get_str("user_name"), Some("mariano"));

        let mut cookies = MockCookieStore::new();
        cookies.set("RememberMe", &[("user_name", "mariano"), ("password", "wrong")]);
        let mut ctx = RequestContext::new(&mut cookies, &mut session, SESSION_KEY);
        assert!(auth.authenticate_remembered(&mut ctx).unwrap().is_none());
        assert!(!auth.needs_password_rehash());
    }

    #[test]
    fn test_logout_expires_cookie_with_configured_options() {
        use crate::session::RequestCookieJar;
        use crate::utils::crypto::derive_encryption_key;
        use actix_web::test as actix_test;

        let mut config = multi_users_config();
        config.cookie.path = "/app".to_string();
        config.cookie.secure = false;
        let auth = authenticator(config, TestFixtures::user_store());

        let req = actix_test::TestRequest::default().to_http_request();
        let mut jar = RequestCookieJar::new(&req, derive_encryption_key(b"logout-secret"));
        auth.logout(&mut jar, None);

        let cookies = jar.take_response_cookies();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name(), "RememberMe");
        assert_eq!(cookies[0].path(), Some("/app"));
        assert_eq!(cookies[0].secure(), Some(false));
        assert!(cookies[0].max_age().unwrap().whole_seconds() < 0);
    }

    #[test]
    fn test_missing_cookie_store_is_a_configuration_error() {
        let auth = authenticator(multi_users_config(), TestFixtures::user_store());
        let mut session = MemorySessionStore::new();
        let mut ctx = RequestContext {
            cookies: None,
            session: &mut session,
            session_key: SESSION_KEY,
        };

        let err = auth.authenticate(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            AuthenticationError::Configuration(ConfigurationError::MissingCookieStore)
        ));
    }

    #[test]
    fn test_store_failure_propagates() {
        let config = AuthConfig {
            user_model: "Ghosts".to_string(),
            ..multi_users_config()
        };
        let auth = authenticator(config, TestFixtures::user_store());
        let mut cookies = MockCookieStore::new();
        let mut session = MemorySessionStore::new();
        cookies.set("RememberMe", &[("user_name", "mariano"), ("password", "password")]);

        let mut ctx = RequestContext::new(&mut cookies, &mut session, SESSION_KEY);
        let err = auth.authenticate(&mut ctx).unwrap_err();
        assert!(matches!(err, AuthenticationError::UserStore(_)));
    }

    #[test]
    fn test_session_failure_propagates() {
        let auth = authenticator(multi_users_config(), TestFixtures::user_store());
        let mut cookies = MockCookieStore::new();
        let mut session = FailingSessionStore;
        cookies.set("RememberMe", &[("user_name", "mariano"), ("password", "password")]);

        let mut ctx = RequestContext::new(&mut cookies, &mut session, SESSION_KEY);
        let err = auth.authenticate(&mut ctx).unwrap_err();
        assert!(matches!(err, AuthenticationError::Session(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_logout_is_idempotent() {
        let auth = authenticator(multi_users_config(), TestFixtures::user_store());
        let mut cookies = MockCookieStore::new();
        cookies.set("RememberMe", &[("user_name", "mariano"), ("password", "password")]);

        let user = Principal::new().with("id", 1);
        auth.logout(&mut cookies, Some(&user));
        auth.logout(&mut cookies, None);

        assert!(cookies.read("RememberMe").is_none());
        assert_eq!(cookies.deletions(), 2);
    }

    #[test]
    fn test_service_name() {
        let auth = authenticator(multi_users_config(), TestFixtures::user_store());
        assert_eq!(auth.service_name(), "cookie");
    }
}
