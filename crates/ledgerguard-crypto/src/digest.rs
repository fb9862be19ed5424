//! SHA-256 integrity digests over plaintext.
//!
//! Computed independently of AEAD authentication so callers can detect
//! post-retrieval tampering or corruption without any key material.

use sha2::{Digest, Sha256};

/// Lowercase-hex SHA-256 of the given bytes (64 characters).
pub fn integrity_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Recompute the digest of `bytes` and compare against `expected_hex`.
///
/// The comparison is case-insensitive on the expected value.
pub fn verify_digest(bytes: &[u8], expected_hex: &str) -> bool {
    integrity_digest(bytes).eq_ignore_ascii_case(expected_hex)
}
