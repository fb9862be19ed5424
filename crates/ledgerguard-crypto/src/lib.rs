pub mod digest;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod types;

pub use digest::{integrity_digest, verify_digest};
pub use envelope::{generate_iv, generate_salt, open, seal, SealedPayload};
pub use error::CryptoError;
pub use kdf::derive_key;
pub use types::{
    AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, CIPHERTEXT_OFFSET, IV_OFFSET,
    MIN_PAYLOAD_LENGTH, PBKDF2_ITERATIONS, SALT_LENGTH,
};
