//! Argon2id password and token hashing

use crate::authentication::traits::PasswordHasher;
use crate::models::ConfigurationError;
use crate::utils::crypto::random_bytes;
use anyhow::anyhow;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

/// Salt length in bytes for newly created hashes
const SALT_LENGTH: usize = 16;

/// Explicit crypto context handed to the hasher at construction
///
/// `pepper` is mixed into every hash as the Argon2 secret input. The cost
/// parameters double as the reference used by `needs_rehash`.
#[derive(Clone)]
pub struct CryptoContext {
    pub pepper: Vec<u8>,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for CryptoContext {
    fn default() -> Self {
        Self {
            pepper: Vec::new(),
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl std::fmt::Debug for CryptoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoContext")
            .field("pepper", &format_args!("<{} bytes>", self.pepper.len()))
            .field("memory_kib", &self.memory_kib)
            .field("iterations", &self.iterations)
            .field("parallelism", &self.parallelism)
            .finish()
    }
}

/// Argon2id implementation of [`PasswordHasher`]
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    pepper: Vec<u8>,
    params: Params,
}

impl std::fmt::Debug for Argon2PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2PasswordHasher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Argon2PasswordHasher {
    /// Build a hasher from an explicit crypto context
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidHasher` when the cost parameters or
    /// the pepper are rejected by Argon2.
    pub fn new(context: CryptoContext) -> Result<Self, ConfigurationError> {
        let params = Params::new(
            context.memory_kib,
            context.iterations,
            context.parallelism,
            None,
        )
        .map_err(|e| ConfigurationError::InvalidHasher(e.to_string()))?;

        let hasher = Self {
            pepper: context.pepper,
            params,
        };
        // surface a bad pepper length at startup rather than on first login
        hasher
            .argon2()
            .map_err(|e| ConfigurationError::InvalidHasher(e.to_string()))?;
        Ok(hasher)
    }

    fn argon2(&self) -> Result<Argon2<'_>, argon2::Error> {
        if self.pepper.is_empty() {
            Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            ))
        } else {
            Argon2::new_with_secret(
                &self.pepper,
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )
        }
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::encode_b64(&random_bytes(SALT_LENGTH))
            .map_err(|e| anyhow!("Failed to encode salt: {e}"))?;
        let argon2 = self.argon2().map_err(|e| anyhow!("Argon2 setup failed: {e}"))?;
        let hash = argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| anyhow!("Password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    fn check(&self, plain: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            log::debug!("Stored hash is not a PHC string");
            return false;
        };
        let Ok(argon2) = self.argon2() else {
            return false;
        };
        argon2.verify_password(plain.as_bytes(), &parsed).is_ok()
    }

    fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }
        if parsed.version != Some(Version::V0x13 as u32) {
            return true;
        }
        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != self.params.m_cost()
                    || stored.t_cost() != self.params.t_cost()
                    || stored.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }
}
