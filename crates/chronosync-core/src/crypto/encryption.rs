//! AES-256-GCM authenticated encryption
//!
//! `seal` output is ciphertext with the 16-byte auth tag appended, the layout
//! the sync code transports as a single segment. Verification failure in
//! `open` is deliberately a single [`ChronoError::AuthenticationFailed`]:
//! a wrong password and a corrupted or tampered code are indistinguishable at
//! this layer, and the error must not leak which one occurred.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use super::MasterKey;
use crate::error::{ChronoError, Result};

/// Nonce length in bytes (96 bits, standard for GCM)
pub const NONCE_LEN: usize = 12;

/// Auth tag length in bytes, appended to the ciphertext by the cipher
pub const TAG_LEN: usize = 16;

/// Generate a fresh random nonce. Never reuse a nonce under the same key.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt plaintext under the key and nonce.
///
/// Returns ciphertext with the auth tag appended.
pub fn seal(plaintext: &[u8], key: &MasterKey, nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ChronoError::EncryptionUnavailable(e.to_string()))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| ChronoError::EncryptionUnavailable(e.to_string()))
}

/// Decrypt and verify ciphertext (with appended tag) under the key and nonce.
pub fn open(ciphertext: &[u8], key: &MasterKey, nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ChronoError::EncryptionUnavailable(e.to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| ChronoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_derivation::{derive_key, generate_salt};

    fn test_key() -> MasterKey {
        let salt = generate_salt();
        derive_key("test-password", &salt)
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = test_key();
        let nonce = generate_nonce();
        let plaintext = b"Hello, World!";

        let sealed = seal(plaintext, &key, &nonce).unwrap();
        let opened = open(&sealed, &key, &nonce).unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_sealed_carries_tag() {
        let key = test_key();
        let nonce = generate_nonce();
        let plaintext = b"some data";

        let sealed = seal(plaintext, &key, &nonce).unwrap();
        assert_eq!(sealed.len(), plaintext.len() + TAG_LEN);
    }

    #[test]
    fn test_different_nonces_produce_different_ciphertext() {
        let key = test_key();
        let plaintext = b"same plaintext";

        let sealed1 = seal(plaintext, &key, &generate_nonce()).unwrap();
        let sealed2 = seal(plaintext, &key, &generate_nonce()).unwrap();

        assert_ne!(sealed1, sealed2);
    }

    #[test]
    fn test_wrong_key_fails_open() {
        let key1 = test_key();
        let key2 = test_key(); // Different key due to different salt
        let nonce = generate_nonce();

        let sealed = seal(b"secret data", &key1, &nonce).unwrap();
        let result = open(&sealed, &key2, &nonce);

        assert!(matches!(result, Err(ChronoError::AuthenticationFailed)));
    }

    #[test]
    fn test_tampered_ciphertext_fails_open() {
        let key = test_key();
        let nonce = generate_nonce();

        let mut sealed = seal(b"secret data", &key, &nonce).unwrap();
        sealed[0] ^= 0xFF;

        let result = open(&sealed, &key, &nonce);
        assert!(matches!(result, Err(ChronoError::AuthenticationFailed)));
    }

    #[test]
    fn test_tampered_tag_fails_open() {
        let key = test_key();
        let nonce = generate_nonce();

        let mut sealed = seal(b"secret data", &key, &nonce).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;

        let result = open(&sealed, &key, &nonce);
        assert!(matches!(result, Err(ChronoError::AuthenticationFailed)));
    }
}
