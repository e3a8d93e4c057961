//! Symmetric encryption for stored calendar credentials.
//!
//! Refresh and access secrets are sealed with AES-256-GCM before they reach
//! the database. The stored blob layout is `nonce || tag || ciphertext`,
//! base64-encoded, with a fresh 96-bit random nonce per seal.

use base64::{engine::general_purpose, Engine as _};
use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, NONCE_LEN};
use ring::error::Unspecified;
use ring::rand::{SecureRandom, SystemRandom};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

/// Error type for secret management operations
#[derive(Debug)]
pub enum SecretError {
    /// Error encrypting a secret
    EncryptionError(String),
    /// Error decrypting a secret
    DecryptionError(String),
    /// Error with the encryption key
    KeyError(String),
    /// I/O error
    IoError(std::io::Error),
    /// Base64 error
    Base64Error(base64::DecodeError),
    /// Ring crypto error
    CryptoError,
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretError::EncryptionError(msg) => write!(f, "Encryption error: {}", msg),
            SecretError::DecryptionError(msg) => write!(f, "Decryption error: {}", msg),
            SecretError::KeyError(msg) => write!(f, "Key error: {}", msg),
            SecretError::IoError(err) => write!(f, "I/O error: {}", err),
            SecretError::Base64Error(err) => write!(f, "Base64 error: {}", err),
            SecretError::CryptoError => write!(f, "Cryptographic operation failed"),
        }
    }
}

impl std::error::Error for SecretError {}

impl From<std::io::Error> for SecretError {
    fn from(err: std::io::Error) -> Self {
        SecretError::IoError(err)
    }
}

impl From<base64::DecodeError> for SecretError {
    fn from(err: base64::DecodeError) -> Self {
        SecretError::Base64Error(err)
    }
}

impl From<Unspecified> for SecretError {
    fn from(_: Unspecified) -> Self {
        SecretError::CryptoError
    }
}

/// A 256-bit AEAD key for sealing and opening stored secrets.
///
/// Constructed explicitly and handed to the credential vault, so tests can
/// run with a throwaway key instead of process-global state.
#[derive(Clone)]
pub struct EncryptionKey {
    key: [u8; 32],
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        write!(f, "EncryptionKey(..)")
    }
}

impl EncryptionKey {
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Load the key from `POLLCAL_ENCRYPTION_KEY` (base64, 32 bytes), then
    /// from the file named by `POLLCAL_ENCRYPTION_KEY_PATH`, and as a last
    /// resort generate a fresh key and write it to that file.
    pub fn from_env() -> Result<Self, SecretError> {
        if let Ok(key_b64) = env::var("POLLCAL_ENCRYPTION_KEY") {
            return Self::from_base64(key_b64.trim());
        }

        let key_path =
            env::var("POLLCAL_ENCRYPTION_KEY_PATH").unwrap_or_else(|_| ".pollcal_key".to_string());

        if Path::new(&key_path).exists() {
            let key_b64 = fs::read_to_string(&key_path)?;
            return Self::from_base64(key_b64.trim());
        }

        // Generate a new key and persist it for subsequent runs.
        let rng = SystemRandom::new();
        let mut key = [0u8; 32];
        rng.fill(&mut key)
            .map_err(|_| SecretError::KeyError("Failed to generate encryption key".to_string()))?;

        let key_b64 = general_purpose::STANDARD.encode(key);
        fs::write(&key_path, &key_b64)?;

        info!("Generated new encryption key and saved to {}", key_path);
        info!("For production, set the POLLCAL_ENCRYPTION_KEY environment variable to:");
        info!("{}", key_b64);

        Ok(Self { key })
    }

    fn from_base64(key_b64: &str) -> Result<Self, SecretError> {
        let key_bytes = general_purpose::STANDARD.decode(key_b64)?;
        if key_bytes.len() != 32 {
            return Err(SecretError::KeyError(format!(
                "Encryption key must be 32 bytes, got {} bytes",
                key_bytes.len()
            )));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&key_bytes);
        Ok(Self { key })
    }

    fn less_safe_key(&self) -> Result<LessSafeKey, SecretError> {
        let unbound = UnboundKey::new(&aead::AES_256_GCM, &self.key)
            .map_err(|_| SecretError::KeyError("Failed to build AEAD key".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt a plaintext secret. Returns base64 of `nonce || tag || ciphertext`.
    pub fn seal(&self, plaintext: &str) -> Result<String, SecretError> {
        let key = self.less_safe_key()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut nonce_bytes)
            .map_err(|_| SecretError::EncryptionError("Failed to generate nonce".to_string()))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| SecretError::EncryptionError("Failed to encrypt data".to_string()))?;

        // seal_in_place leaves ciphertext || tag; the stored layout puts the
        // tag ahead of the ciphertext.
        let tag_len = aead::AES_256_GCM.tag_len();
        let ct_len = in_out.len() - tag_len;
        let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&in_out[ct_len..]);
        blob.extend_from_slice(&in_out[..ct_len]);

        Ok(general_purpose::STANDARD.encode(blob))
    }

    /// Decrypt a blob produced by [`EncryptionKey::seal`].
    ///
    /// Fails closed: a tampered tag, truncated blob, or wrong key all come
    /// back as `DecryptionError`, never as wrong plaintext.
    pub fn open(&self, blob_b64: &str) -> Result<String, SecretError> {
        let blob = general_purpose::STANDARD.decode(blob_b64)?;

        let tag_len = aead::AES_256_GCM.tag_len();
        if blob.len() < NONCE_LEN + tag_len {
            return Err(SecretError::DecryptionError(
                "Encrypted blob is too short".to_string(),
            ));
        }

        let (nonce_bytes, rest) = blob.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(tag_len);

        // Rebuild the ciphertext || tag order ring expects.
        let mut in_out = ciphertext.to_vec();
        in_out.extend_from_slice(tag);

        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| SecretError::DecryptionError("Invalid nonce".to_string()))?;
        let key = self.less_safe_key()?;

        let plaintext = key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| SecretError::DecryptionError("Failed to decrypt data".to_string()))?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| {
            SecretError::DecryptionError("Decrypted data is not valid UTF-8".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use proptest::prelude::*;

    fn test_key() -> EncryptionKey {
        EncryptionKey::from_bytes([7u8; 32])
    }

    #[test]
    fn seal_then_open_round_trips() {
        let key = test_key();
        let sealed = key.seal("1//refresh-secret").unwrap();
        assert_eq!(key.open(&sealed).unwrap(), "1//refresh-secret");
    }

    #[test]
    fn nonce_is_fresh_per_seal() {
        let key = test_key();
        let a = key.seal("same input").unwrap();
        let b = key.seal("same input").unwrap();
        assert_ne!(a, b, "two seals of the same plaintext must differ");
    }

    #[test]
    fn tampered_blob_fails_closed() {
        let key = test_key();
        let sealed = key.seal("secret").unwrap();
        let mut raw = general_purpose::STANDARD.decode(&sealed).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = general_purpose::STANDARD.encode(raw);
        assert!(matches!(
            key.open(&tampered),
            Err(SecretError::DecryptionError(_))
        ));
    }

    #[test]
    fn wrong_key_fails_closed() {
        let sealed = test_key().seal("secret").unwrap();
        let other = EncryptionKey::from_bytes([8u8; 32]);
        assert!(other.open(&sealed).is_err());
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let key = test_key();
        assert!(key.open("").is_err());
        assert!(key
            .open(&general_purpose::STANDARD.encode([0u8; 10]))
            .is_err());
    }

    #[test]
    fn garbage_base64_is_rejected() {
        assert!(matches!(
            test_key().open("not base64 at all!!"),
            Err(SecretError::Base64Error(_))
        ));
    }

    proptest! {
        #[test]
        fn round_trip_arbitrary_strings(plaintext in ".*") {
            let key = test_key();
            let sealed = key.seal(&plaintext).unwrap();
            prop_assert_eq!(key.open(&sealed).unwrap(), plaintext);
        }

        #[test]
        fn bit_flips_never_decrypt(plaintext in ".+", flip_byte in 0usize..16, flip_bit in 0u8..8) {
            let key = test_key();
            let sealed = key.seal(&plaintext).unwrap();
            let mut raw = general_purpose::STANDARD.decode(&sealed).unwrap();
            let idx = flip_byte % raw.len();
            raw[idx] ^= 1 << flip_bit;
            let tampered = general_purpose::STANDARD.encode(raw);
            prop_assert!(key.open(&tampered).is_err());
        }
    }
}
