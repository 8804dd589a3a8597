// Cookie encryption helpers and random secret generation

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Generate `length` random bytes and return them base64url-encoded
#[must_use]
pub fn generate_secret(length: usize) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(random_bytes(length))
}

/// Fill a fresh buffer with `length` bytes from the thread-local CSPRNG
#[must_use]
pub fn random_bytes(length: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; length];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Generic encryption function for any serializable data using AES-256-GCM
///
/// # Arguments
///
/// * `data` - The data to encrypt (must implement Serialize)
/// * `key` - The encryption key (must be 32 bytes for AES-256)
///
/// # Returns
///
/// A Base64URL-encoded string containing the nonce + ciphertext
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
/// - Key length is invalid
/// - AES encryption fails
pub fn encrypt_data<T: Serialize>(data: &T, key: &[u8]) -> Result<String> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let json_data = serde_json::to_string(data).context("Failed to serialize data")?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let ciphertext = cipher
        .encrypt(nonce, json_data.as_bytes())
        .map_err(|e| anyhow!("AES encryption failed: {e}"))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
}

/// Generic decryption function for any deserializable data using AES-256-GCM
///
/// # Errors
///
/// Returns an error if:
/// - Key length is invalid
/// - Base64 decoding fails
/// - Data length is invalid
/// - AES decryption fails (wrong key or tampered value)
/// - Deserialization fails
pub fn decrypt_data<T: DeserializeOwned>(encrypted_data: &str, key: &[u8]) -> Result<T> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let combined = general_purpose::URL_SAFE_NO_PAD
        .decode(encrypted_data)
        .map_err(|e| anyhow!("Failed to decode base64 data: {e}"))?;

    if combined.len() < NONCE_SIZE {
        return Err(anyhow!("Invalid data length"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

    serde_json::from_slice(&plaintext).context("Failed to deserialize data from decrypted JSON")
}

/// Derive a 32-byte AES-256 key from configured key material
///
/// Input that is already exactly 32 bytes is used as-is; anything else
/// (including an empty secret) is run through SHA-256.
#[must_use]
pub fn derive_encryption_key(input_key: &[u8]) -> [u8; ENCRYPTION_KEY_SIZE] {
    let mut encryption_key = [0u8; ENCRYPTION_KEY_SIZE];
    if input_key.len() == ENCRYPTION_KEY_SIZE {
        encryption_key.copy_from_slice(input_key);
    } else {
        encryption_key.copy_from_slice(&Sha256::digest(input_key));
    }
    encryption_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TEST_KEY: &[u8] = b"test_key_32_bytes_long_for_test_";

    #[test]
    fn test_encrypt_decrypt_cookie_payload() {
        let mut payload = HashMap::new();
        payload.insert("user_name".to_string(), "mariano".to_string());
        payload.insert("password".to_string(), "password".to_string());

        let encrypted = encrypt_data(&payload, TEST_KEY).unwrap();
        assert!(!encrypted.contains("mariano"));

        let decrypted: HashMap<String, String> = decrypt_data(&encrypted, TEST_KEY).unwrap();
        assert_eq!(decrypted, payload);
    }

    #[test]
    fn test_encryption_uses_fresh_nonce() {
        let first = encrypt_data(&"same", TEST_KEY).unwrap();
        let second = encrypt_data(&"same", TEST_KEY).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let encrypted = encrypt_data(&"secret", TEST_KEY).unwrap();
        let other_key = derive_encryption_key(b"another key entirely");
        let result: Result<String> = decrypt_data(&encrypted, &other_key);
        assert!(result.is_err());
    }

    #[test]
    fn test_decrypt_rejects_garbage() {
        let short: Result<String> = decrypt_data("AAAA", TEST_KEY);
        assert!(short.unwrap_err().to_string().contains("Invalid data length"));

        let not_base64: Result<String> = decrypt_data("!!!not base64!!!", TEST_KEY);
        assert!(not_base64
            .unwrap_err()
            .to_string()
            .starts_with("Failed to decode base64 data"));
    }

    #[test]
    fn test_invalid_key_length() {
        let err = encrypt_data(&"x", b"short").unwrap_err();
        assert!(err.to_string().contains("Invalid key length"));
    }

    #[test]
    fn test_derive_encryption_key() {
        assert_eq!(derive_encryption_key(TEST_KEY).as_slice(), TEST_KEY);

        let derived = derive_encryption_key(b"short secret");
        assert_eq!(derived, derive_encryption_key(b"short secret"));
        assert_ne!(derived, derive_encryption_key(b"other secret"));

        // empty input must not panic
        let _ = derive_encryption_key(b"");
    }

    #[test]
    fn test_generate_secret() {
        let secret = generate_secret(32);
        assert_eq!(secret.len(), 43);
        assert_ne!(secret, generate_secret(32));
    }
}
