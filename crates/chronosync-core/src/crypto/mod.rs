//! Cryptographic primitives for the encrypted snapshot sync
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation from passwords
//! - AES-256-GCM authenticated encryption
//! - Secure key handling with zeroize

mod encryption;
mod key_derivation;
mod secure_memory;

pub use encryption::{generate_nonce, open, seal, NONCE_LEN, TAG_LEN};
pub use key_derivation::{derive_key, generate_salt, PBKDF2_ITERATIONS, SALT_LEN};
pub use secure_memory::MasterKey;
