//! Content-addressed storage boundary.
//!
//! Backends own addressing: a [`ContentId`] is the lowercase-hex SHA-256 of
//! the stored bytes. The store treats the backend as opaque and never hashes
//! or chunks on its behalf.

pub mod fs;
pub mod memory;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Ordered chunk stream returned by [`CasBackend::cat`].
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BackendError>> + Send>>;

/// Content identifier: lowercase-hex SHA-256 of the stored bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Compute the identifier for a block of bytes.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Parse an identifier from its hex form.
    pub fn parse(s: &str) -> Result<Self, BackendError> {
        if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(BackendError::InvalidCid(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Hex form of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Size and pin status of a stored block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStat {
    pub size: u64,
    pub pinned: bool,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Content not found: {0}")]
    NotFound(ContentId),

    #[error("Invalid content identifier: {0:?}")]
    InvalidCid(String),

    #[error("Backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Content-addressed storage backend: add bytes, read them back by
/// identifier, and pin what must survive garbage collection.
#[async_trait]
pub trait CasBackend: Send + Sync {
    /// Store bytes and return their content identifier.
    async fn add(&self, bytes: &[u8]) -> Result<ContentId, BackendError>;

    /// Read content back as an ordered chunk stream.
    ///
    /// Unknown identifiers return [`BackendError::NotFound`].
    async fn cat(&self, cid: &ContentId) -> Result<ByteStream, BackendError>;

    /// Mark content as retained so garbage collection will not remove it.
    async fn pin(&self, cid: &ContentId) -> Result<(), BackendError>;

    /// Size and pin status, or `None` if the content is unknown.
    async fn stat(&self, cid: &ContentId) -> Result<Option<BlockStat>, BackendError>;
}

#[async_trait]
impl<B: CasBackend + ?Sized> CasBackend for Arc<B> {
    async fn add(&self, bytes: &[u8]) -> Result<ContentId, BackendError> {
        (**self).add(bytes).await
    }

    async fn cat(&self, cid: &ContentId) -> Result<ByteStream, BackendError> {
        (**self).cat(cid).await
    }

    async fn pin(&self, cid: &ContentId) -> Result<(), BackendError> {
        (**self).pin(cid).await
    }

    async fn stat(&self, cid: &ContentId) -> Result<Option<BlockStat>, BackendError> {
        (**self).stat(cid).await
    }
}
