//! Password-based key derivation using PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use super::MasterKey;

/// Salt length in bytes (128 bits)
pub const SALT_LEN: usize = 16;

/// PBKDF2 iteration count. Fixed rather than configurable so a misconfigured
/// caller cannot weaken derivation; changing it invalidates existing sync
/// codes.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit key from a password and salt.
///
/// Deterministic: the same password and salt always yield the same key. The
/// salt provides per-export domain separation, so every export must use a
/// fresh one from [`generate_salt`].
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> MasterKey {
    let mut key_bytes = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key_bytes);
    MasterKey::new(key_bytes)
}
