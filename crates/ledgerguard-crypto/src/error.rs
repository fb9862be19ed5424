use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Passphrase must not be empty")]
    EmptyPassphrase,

    #[error("Sealed payload too short")]
    PayloadTooShort,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
