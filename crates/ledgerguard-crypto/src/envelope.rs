//! AES-256-GCM sealed payloads.
//!
//! Payload layout: [16 bytes: salt][12 bytes: IV][N bytes: ciphertext + tag]
//! Salt and IV are fresh random values for every seal; the key is re-derived
//! from the passphrase and the embedded salt on open.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::kdf::derive_key;
use crate::types::{
    AES_GCM_IV_LENGTH, CIPHERTEXT_OFFSET, IV_OFFSET, MIN_PAYLOAD_LENGTH, SALT_LENGTH,
};

/// Generate a random 16-byte KDF salt.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH], CryptoError> {
    let mut salt = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(salt)
}

/// Generate a random 12-byte IV for AES-GCM.
pub fn generate_iv() -> Result<[u8; AES_GCM_IV_LENGTH], CryptoError> {
    let mut iv = [0u8; AES_GCM_IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

/// Borrowed view of a sealed payload, split at the fixed offsets.
#[derive(Debug)]
pub struct SealedPayload<'a> {
    /// KDF salt, bytes `[0, 16)`.
    pub salt: &'a [u8],
    /// AES-GCM IV, bytes `[16, 28)`.
    pub iv: &'a [u8],
    /// Ciphertext with appended tag, bytes `[28, ..)`.
    pub ciphertext: &'a [u8],
}

impl<'a> SealedPayload<'a> {
    /// Split a payload into salt / IV / ciphertext parts.
    pub fn parse(payload: &'a [u8]) -> Result<Self, CryptoError> {
        if payload.len() < MIN_PAYLOAD_LENGTH {
            return Err(CryptoError::PayloadTooShort);
        }
        Ok(Self {
            salt: &payload[..IV_OFFSET],
            iv: &payload[IV_OFFSET..CIPHERTEXT_OFFSET],
            ciphertext: &payload[CIPHERTEXT_OFFSET..],
        })
    }
}

/// Seal plaintext under a passphrase.
///
/// Returns `salt || IV || ciphertext+tag`. A fresh salt and IV are drawn for
/// every call, so sealing the same input twice yields different payloads
/// that both open to the same plaintext.
pub fn seal(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>, CryptoError> {
    let salt = generate_salt()?;
    let mut key = derive_key(passphrase, &salt)?;
    let iv = generate_iv()?;

    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|e| CryptoError::EncryptionFailed(e.to_string()));
    key.zeroize();

    let ciphertext = cipher?
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut payload = Vec::with_capacity(CIPHERTEXT_OFFSET + ciphertext.len());
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&iv);
    payload.extend_from_slice(&ciphertext);
    Ok(payload)
}

/// Open a sealed payload with a passphrase.
///
/// An authentication tag mismatch (wrong passphrase or tampered bytes)
/// surfaces as `DecryptionFailed`, never as corrupted plaintext.
pub fn open(payload: &[u8], passphrase: &str) -> Result<Vec<u8>, CryptoError> {
    let parts = SealedPayload::parse(payload)?;
    let mut key = derive_key(passphrase, parts.salt)?;

    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|e| CryptoError::DecryptionFailed(e.to_string()));
    key.zeroize();

    cipher?
        .decrypt(Nonce::from_slice(parts.iv), parts.ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}
