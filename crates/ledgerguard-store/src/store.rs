//! Passphrase-sealed blob storage over a content-addressed backend.
//!
//! Upload: digest plaintext → seal(passphrase) → backend.add → backend.pin
//! Download: backend.cat → reassemble chunks → open(passphrase)

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::StreamExt;

use ledgerguard_crypto::{envelope, integrity_digest, verify_digest};

use crate::backend::{BackendError, CasBackend, ContentId};
use crate::error::StoreError;
use crate::init::InitCell;

/// Outcome of a successful upload: where the sealed bytes live and the
/// plaintext digest recorded for later verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub cid: ContentId,
    /// Lowercase-hex SHA-256 of the plaintext (64 characters).
    pub integrity_hex: String,
}

type Connector<B> = Box<dyn Fn() -> BoxFuture<'static, Result<B, BackendError>> + Send + Sync>;

/// Encrypts blobs under a per-call passphrase and hands the sealed payload
/// to a content-addressed backend.
///
/// The passphrase is never stored; it is supplied per call and the derived
/// key never escapes that call's scope. The backend handle is the only
/// shared mutable state: it is connected lazily and race-safely via
/// [`InitCell`], and a failed connection is retried on the next call.
pub struct SecureBlobStore<B: CasBackend + 'static> {
    backend: InitCell<B>,
    connect: Option<Connector<B>>,
}

impl<B: CasBackend + 'static> SecureBlobStore<B> {
    /// Create a store that connects to its backend lazily on first use.
    pub fn new<F, Fut>(connect: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<B, BackendError>> + Send + 'static,
    {
        Self {
            backend: InitCell::new(),
            connect: Some(Box::new(move || Box::pin(connect()))),
        }
    }

    /// Create a store around an already-connected backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend: InitCell::ready(backend),
            connect: None,
        }
    }

    async fn backend(&self) -> Result<Arc<B>, StoreError> {
        match &self.connect {
            Some(connect) => self.backend.get_or_init(|| connect()).await,
            None => self
                .backend
                .get()
                .ok_or_else(|| StoreError::Initialization("no backend connector".into())),
        }
    }

    /// Seal `bytes` under `passphrase` and store the payload.
    ///
    /// The returned [`StoredBlob`] carries the content identifier of the
    /// sealed payload and the plaintext integrity digest. The payload is
    /// pinned immediately after upload.
    pub async fn encrypt_and_store(
        &self,
        bytes: &[u8],
        passphrase: &str,
    ) -> Result<StoredBlob, StoreError> {
        let backend = self.backend().await?;

        let integrity_hex = integrity_digest(bytes);
        let payload = envelope::seal(bytes, passphrase).map_err(StoreError::Encryption)?;

        let cid = backend.add(&payload).await?;
        backend.pin(&cid).await?;

        tracing::debug!(
            cid = %cid,
            size = bytes.len(),
            sealed_size = payload.len(),
            "stored sealed blob"
        );
        Ok(StoredBlob { cid, integrity_hex })
    }

    /// Fetch the sealed payload for `cid` and open it with `passphrase`.
    ///
    /// Chunks are reassembled in stream order. A wrong passphrase or
    /// tampered payload surfaces as [`StoreError::Decryption`]; a missing
    /// or unreadable payload as [`StoreError::Backend`].
    pub async fn retrieve_and_decrypt(
        &self,
        cid: &ContentId,
        passphrase: &str,
    ) -> Result<Vec<u8>, StoreError> {
        let backend = self.backend().await?;

        let mut stream = backend.cat(cid).await?;
        let mut payload = Vec::new();
        while let Some(chunk) = stream.next().await {
            payload.extend_from_slice(&chunk?);
        }

        let plaintext = envelope::open(&payload, passphrase).map_err(StoreError::Decryption)?;
        tracing::debug!(cid = %cid, size = plaintext.len(), "retrieved sealed blob");
        Ok(plaintext)
    }

    /// Recompute the digest of `bytes` and compare it to a previously
    /// recorded value.
    ///
    /// Intended for the retrieved, decrypted artifact: the digest recorded
    /// at store time is checked against the plaintext after retrieval,
    /// catching post-retrieval tampering or corruption independently of the
    /// cipher's authentication tag.
    pub fn verify_integrity(&self, bytes: &[u8], expected_hex: &str) -> Result<(), StoreError> {
        if verify_digest(bytes, expected_hex) {
            return Ok(());
        }
        let computed = integrity_digest(bytes);
        tracing::warn!(expected = expected_hex, computed = %computed, "integrity mismatch");
        Err(StoreError::IntegrityMismatch {
            expected: expected_hex.to_string(),
            computed,
        })
    }
}
