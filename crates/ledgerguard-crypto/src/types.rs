/// PBKDF2 salt length in bytes. A fresh salt is drawn for every seal.
pub const SALT_LENGTH: usize = 16;

/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;

/// PBKDF2-HMAC-SHA256 iteration count.
///
/// Fixed so any payload can be opened knowing only the passphrase; the salt
/// travels in the payload itself.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Offset of the IV within a sealed payload.
pub const IV_OFFSET: usize = SALT_LENGTH;

/// Offset of the ciphertext within a sealed payload.
pub const CIPHERTEXT_OFFSET: usize = SALT_LENGTH + AES_GCM_IV_LENGTH;

/// Minimum sealed payload length: salt + IV + tag (empty plaintext).
pub const MIN_PAYLOAD_LENGTH: usize = CIPHERTEXT_OFFSET + AES_GCM_TAG_LENGTH;
