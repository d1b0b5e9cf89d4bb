//! Encrypted snapshot sync codec
//!
//! Wire format: `{salt_b64}.{nonce_b64}.{ciphertext_b64}`
//! - Salt: 16 bytes, per-export PBKDF2 domain separation
//! - Nonce: 12 bytes (96 bits) - standard for GCM
//! - Ciphertext: variable length, 16-byte auth tag appended
//!
//! The segment order is part of the wire format and must not change. The
//! result is a single printable string safe to move through plain-text
//! channels (clipboard, chat, email).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;

use crate::crypto::{
    self, derive_key, generate_nonce, generate_salt, NONCE_LEN, SALT_LEN,
};
use crate::error::{ChronoError, Result};
use crate::snapshot::Snapshot;

/// Segment delimiter in the packed sync code
const DELIMITER: char = '.';

/// Top-level fields a decoded snapshot must carry
const REQUIRED_FIELDS: [&str; 3] = ["owner", "tasks", "tags"];

/// An unpacked sync code: salt, nonce, and ciphertext with appended tag
#[derive(Debug, Clone)]
pub struct SyncCode {
    /// PBKDF2 salt (16 bytes)
    pub salt: [u8; SALT_LEN],
    /// AES-GCM nonce (12 bytes)
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the auth tag appended
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Display for SyncCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            BASE64.encode(self.salt),
            BASE64.encode(self.nonce),
            BASE64.encode(&self.ciphertext)
        )
    }
}

impl SyncCode {
    /// Parse from the packed format: `{salt_b64}.{nonce_b64}.{ciphertext_b64}`
    pub fn from_string(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(DELIMITER).collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(ChronoError::MalformedCode);
        }

        let salt_bytes = BASE64
            .decode(parts[0])
            .map_err(|e| ChronoError::InvalidEncoding(format!("salt segment: {}", e)))?;
        let nonce_bytes = BASE64
            .decode(parts[1])
            .map_err(|e| ChronoError::InvalidEncoding(format!("nonce segment: {}", e)))?;
        let ciphertext = BASE64
            .decode(parts[2])
            .map_err(|e| ChronoError::InvalidEncoding(format!("ciphertext segment: {}", e)))?;

        // Wrong-length salt or nonce means the structure, not the encoding,
        // is wrong
        let salt: [u8; SALT_LEN] = salt_bytes
            .try_into()
            .map_err(|_| ChronoError::MalformedCode)?;
        let nonce: [u8; NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| ChronoError::MalformedCode)?;

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }
}

/// Encrypt a snapshot under a password, producing a portable sync code.
///
/// Every call draws a fresh random salt and nonce, so encoding the same
/// snapshot twice never yields the same code.
pub fn encode(snapshot: &Snapshot, password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(ChronoError::EmptyPassword);
    }

    let salt = generate_salt();
    let nonce = generate_nonce();
    let key = derive_key(password, &salt);

    let plaintext = serde_json::to_vec(snapshot)?;
    let ciphertext = crypto::seal(&plaintext, &key, &nonce)?;

    let code = SyncCode {
        salt,
        nonce,
        ciphertext,
    };
    Ok(code.to_string())
}

/// Decrypt a sync code back into a snapshot.
///
/// Purely functional: no caller state is touched on any failure path. A
/// wrong password and a corrupted or tampered code both surface as
/// [`ChronoError::AuthenticationFailed`].
pub fn decode(code: &str, password: &str) -> Result<Snapshot> {
    let unpacked = SyncCode::from_string(code)?;

    let key = derive_key(password, &unpacked.salt);
    let plaintext = crypto::open(&unpacked.ciphertext, &key, &unpacked.nonce)?;

    decode_snapshot(&plaintext)
}

/// Deserialize decrypted bytes, rejecting structures missing a required field
fn decode_snapshot(plaintext: &[u8]) -> Result<Snapshot> {
    let value: Value = serde_json::from_slice(plaintext)
        .map_err(|e| ChronoError::IncompleteSnapshot(e.to_string()))?;

    for field in REQUIRED_FIELDS {
        if value.get(field).is_none() {
            return Err(ChronoError::IncompleteSnapshot(format!(
                "missing required field '{}'",
                field
            )));
        }
    }

    serde_json::from_value(value).map_err(|e| ChronoError::IncompleteSnapshot(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{TagDefinition, Task};

    fn sample_snapshot() -> Snapshot {
        Snapshot::new(
            "alice",
            vec![Task {
                id: "1".to_string(),
                date: "2024-01-01".to_string(),
                start_time: "09:00".to_string(),
                end_time: "10:00".to_string(),
                description: "Write report".to_string(),
                tag: "Work".to_string(),
                image_url: None,
            }],
            vec![TagDefinition {
                name: "Work".to_string(),
                color: "#0ea5e9".to_string(),
            }],
        )
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let snapshot = sample_snapshot();
        let code = encode(&snapshot, "correct-horse-battery-staple").unwrap();
        let decoded = decode(&code, "correct-horse-battery-staple").unwrap();

        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_roundtrip_with_image_and_empty_lists() {
        let mut snapshot = sample_snapshot();
        snapshot.tasks[0].image_url = Some("data:image/png;base64,iVBORw0KGgo=".to_string());

        let code = encode(&snapshot, "pw").unwrap();
        assert_eq!(decode(&code, "pw").unwrap(), snapshot);

        let empty = Snapshot::new("bob", vec![], vec![]);
        let code = encode(&empty, "pw").unwrap();
        assert_eq!(decode(&code, "pw").unwrap(), empty);
    }

    #[test]
    fn test_wrong_password_rejected() {
        let code = encode(&sample_snapshot(), "correct-horse-battery-staple").unwrap();
        let result = decode(&code, "wrong-password");

        assert!(matches!(result, Err(ChronoError::AuthenticationFailed)));
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let code = encode(&sample_snapshot(), "pw").unwrap();
        let mut unpacked = SyncCode::from_string(&code).unwrap();

        // Flip one byte anywhere in the ciphertext segment
        unpacked.ciphertext[0] ^= 0x01;
        let result = decode(&unpacked.to_string(), "pw");

        assert!(matches!(result, Err(ChronoError::AuthenticationFailed)));
    }

    #[test]
    fn test_tamper_detected_at_any_position() {
        let code = encode(&sample_snapshot(), "pw").unwrap();
        let unpacked = SyncCode::from_string(&code).unwrap();

        // First byte, a middle byte, and a tag byte; each decode pays a
        // full key derivation
        let len = unpacked.ciphertext.len();
        for i in [0, len / 2, len - 1] {
            let mut tampered = unpacked.clone();
            tampered.ciphertext[i] ^= 0xFF;
            let result = decode(&tampered.to_string(), "pw");
            assert!(
                matches!(result, Err(ChronoError::AuthenticationFailed)),
                "byte {} not authenticated",
                i
            );
        }
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_encode() {
        let snapshot = sample_snapshot();

        let code1 = encode(&snapshot, "pw").unwrap();
        let code2 = encode(&snapshot, "pw").unwrap();
        assert_ne!(code1, code2);

        let unpacked1 = SyncCode::from_string(&code1).unwrap();
        let unpacked2 = SyncCode::from_string(&code2).unwrap();
        assert_ne!(unpacked1.salt, unpacked2.salt);
        assert_ne!(unpacked1.nonce, unpacked2.nonce);

        // Both still decode under the same password
        assert_eq!(decode(&code1, "pw").unwrap(), snapshot);
        assert_eq!(decode(&code2, "pw").unwrap(), snapshot);
    }

    #[test]
    fn test_malformed_code() {
        let result = decode("not-a-valid-code", "pw");
        assert!(matches!(result, Err(ChronoError::MalformedCode)));

        assert!(matches!(
            decode("a.b", "pw"),
            Err(ChronoError::MalformedCode)
        ));
        assert!(matches!(
            decode("a.b.c.d", "pw"),
            Err(ChronoError::MalformedCode)
        ));
        assert!(matches!(
            decode("..", "pw"),
            Err(ChronoError::MalformedCode)
        ));
    }

    #[test]
    fn test_invalid_base64() {
        let result = decode("a.b.c", "pw");
        assert!(matches!(result, Err(ChronoError::InvalidEncoding(_))));
    }

    #[test]
    fn test_wrong_length_segments_are_malformed() {
        // Valid base64 but an 8-byte salt
        let short_salt = BASE64.encode([0u8; 8]);
        let nonce = BASE64.encode([0u8; NONCE_LEN]);
        let ct = BASE64.encode([0u8; 32]);
        let result = decode(&format!("{short_salt}.{nonce}.{ct}"), "pw");

        assert!(matches!(result, Err(ChronoError::MalformedCode)));
    }

    #[test]
    fn test_empty_password_guard() {
        let result = encode(&sample_snapshot(), "");
        assert!(matches!(result, Err(ChronoError::EmptyPassword)));
    }

    #[test]
    fn test_incomplete_snapshot_rejected() {
        // Seal a payload that decrypts fine but is missing "tags"
        let salt = generate_salt();
        let nonce = generate_nonce();
        let key = derive_key("pw", &salt);
        let ciphertext = crypto::seal(br#"{"owner":"alice","tasks":[]}"#, &key, &nonce).unwrap();

        let code = SyncCode {
            salt,
            nonce,
            ciphertext,
        }
        .to_string();

        match decode(&code, "pw") {
            Err(ChronoError::IncompleteSnapshot(msg)) => assert!(msg.contains("tags")),
            other => panic!("expected IncompleteSnapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_code_is_printable() {
        let code = encode(&sample_snapshot(), "pw").unwrap();
        assert!(code.chars().all(|c| c.is_ascii_graphic()));
        assert_eq!(code.matches(DELIMITER).count(), 2);
    }
}
