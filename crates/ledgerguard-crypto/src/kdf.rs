//! PBKDF2-HMAC-SHA256 passphrase stretching.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::error::CryptoError;
use crate::types::{AES_KEY_LENGTH, PBKDF2_ITERATIONS};

/// Derive a 256-bit key from a passphrase and salt.
///
/// # Arguments
/// * `passphrase` - Non-empty user passphrase
/// * `salt` - Random salt (stored alongside the ciphertext)
///
/// # Returns
/// 32-byte derived key
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; AES_KEY_LENGTH], CryptoError> {
    if passphrase.is_empty() {
        return Err(CryptoError::EmptyPassphrase);
    }
    let mut key = [0u8; AES_KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = derive_key("correct-horse", b"salt-0123456789a").unwrap();
        let b = derive_key("correct-horse", b"salt-0123456789a").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_salts_different_keys() {
        let a = derive_key("correct-horse", b"salt-a").unwrap();
        let b = derive_key("correct-horse", b"salt-b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn different_passphrases_different_keys() {
        let a = derive_key("correct-horse", b"salt").unwrap();
        let b = derive_key("wrong-pass", b"salt").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_empty_passphrase() {
        let err = derive_key("", b"salt").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }
}
