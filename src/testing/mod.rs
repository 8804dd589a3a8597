//! Testing utilities for Remembrs
//!
//! Shared fixtures and fakes used by unit tests and by the integration tests
//! under `tests/` (enable the `testing` feature for those).
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built user tables, hashers and settings
//! - [`mock`] - In-memory fakes for the authenticator's collaborators
//!
//! ## Usage
//!
//! ```rust
//! use remembrs::testing::TestFixtures;
//!
//! fn test_with_users() {
//!     let store = TestFixtures::user_store();
//!     assert_eq!(store.table_len("MultiUsers"), 5);
//! }
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Session key the principal is written under
    pub const SESSION_KEY: &str = "Auth.User";

    /// Plaintext password shared by every fixture user
    pub const TEST_PASSWORD: &str = "password";

    /// Identifier of the fixture user holding an ephemeral token
    pub const TOKEN_UUID: &str = "e99a6234-22d0-4676-b4e1-4c58b9c937d5";

    /// Plaintext ephemeral token carried in the remember-me cookie
    pub const TOKEN_VALUE: &str = "a4e4243a-946f-44b4-8250-886c4e068de2";

    /// Test encryption secret (256 bits)
    pub const TEST_SECRET: &[u8] = b"test_key_32_bytes_long_for_test_";

    /// Test pepper mixed into fixture hashes
    pub const TEST_PEPPER: &[u8] = b"test-pepper";
}
