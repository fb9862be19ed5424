use ledgerguard_crypto::CryptoError;
use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend connector failed; retried lazily on the next call.
    #[error("Backend initialization failed: {0}")]
    Initialization(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Encryption failed: {0}")]
    Encryption(#[source] CryptoError),

    /// Wrong passphrase or tampered ciphertext (authentication tag check
    /// failed). Deterministic for the same inputs, never retried.
    #[error("Decryption failed: {0}")]
    Decryption(#[source] CryptoError),

    #[error("Integrity mismatch: expected {expected}, computed {computed}")]
    IntegrityMismatch { expected: String, computed: String },
}
