//! In-memory backend for tests and ephemeral use.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use super::{BackendError, BlockStat, ByteStream, CasBackend, ContentId};

/// Chunk size used when streaming content back out.
const CAT_CHUNK_SIZE: usize = 64 * 1024;

/// HashMap-backed [`CasBackend`].
///
/// Reads are chunked like a real backend so callers exercise the stream
/// reassembly path. Interior mutability via `parking_lot::Mutex`
/// (Send + Sync on all targets). Lock order is blocks before pins.
#[derive(Default)]
pub struct MemoryBackend {
    blocks: Mutex<HashMap<ContentId, Bytes>>,
    pins: Mutex<HashSet<ContentId>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.lock().is_empty()
    }

    /// Drop all unpinned blocks. Returns the number removed.
    pub fn gc(&self) -> usize {
        let mut blocks = self.blocks.lock();
        let pins = self.pins.lock();
        let before = blocks.len();
        blocks.retain(|cid, _| pins.contains(cid));
        before - blocks.len()
    }
}

#[async_trait]
impl CasBackend for MemoryBackend {
    async fn add(&self, bytes: &[u8]) -> Result<ContentId, BackendError> {
        let cid = ContentId::for_bytes(bytes);
        self.blocks
            .lock()
            .insert(cid.clone(), Bytes::copy_from_slice(bytes));
        Ok(cid)
    }

    async fn cat(&self, cid: &ContentId) -> Result<ByteStream, BackendError> {
        let block = self
            .blocks
            .lock()
            .get(cid)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(cid.clone()))?;

        let chunks: Vec<Result<Bytes, BackendError>> = block
            .chunks(CAT_CHUNK_SIZE)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn pin(&self, cid: &ContentId) -> Result<(), BackendError> {
        if !self.blocks.lock().contains_key(cid) {
            return Err(BackendError::NotFound(cid.clone()));
        }
        self.pins.lock().insert(cid.clone());
        Ok(())
    }

    async fn stat(&self, cid: &ContentId) -> Result<Option<BlockStat>, BackendError> {
        let size = {
            let blocks = self.blocks.lock();
            match blocks.get(cid) {
                Some(block) => block.len() as u64,
                None => return Ok(None),
            }
        };
        let pinned = self.pins.lock().contains(cid);
        Ok(Some(BlockStat { size, pinned }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn add_cat_round_trip() {
        let backend = MemoryBackend::new();
        let cid = backend.add(b"hello blocks").await.unwrap();
        let bytes = collect(backend.cat(&cid).await.unwrap()).await;
        assert_eq!(bytes, b"hello blocks");
    }

    #[tokio::test]
    async fn cat_streams_multiple_chunks() {
        let backend = MemoryBackend::new();
        let data = vec![7u8; CAT_CHUNK_SIZE * 2 + 17];
        let cid = backend.add(&data).await.unwrap();

        let mut stream = backend.cat(&cid).await.unwrap();
        let mut chunks = 0;
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
            chunks += 1;
        }
        assert_eq!(chunks, 3);
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn cat_unknown_cid_is_not_found() {
        let backend = MemoryBackend::new();
        let missing = ContentId::for_bytes(b"never stored");
        let err = match backend.cat(&missing).await {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn pin_unknown_cid_is_not_found() {
        let backend = MemoryBackend::new();
        let missing = ContentId::for_bytes(b"never stored");
        assert!(backend.pin(&missing).await.is_err());
    }

    #[tokio::test]
    async fn gc_keeps_pinned_blocks() {
        let backend = MemoryBackend::new();
        let pinned = backend.add(b"keep me").await.unwrap();
        backend.pin(&pinned).await.unwrap();
        let unpinned = backend.add(b"drop me").await.unwrap();

        assert_eq!(backend.gc(), 1);
        assert!(backend.stat(&pinned).await.unwrap().is_some());
        assert!(backend.stat(&unpinned).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stat_reports_size_and_pin() {
        let backend = MemoryBackend::new();
        let cid = backend.add(b"12345").await.unwrap();

        let stat = backend.stat(&cid).await.unwrap().unwrap();
        assert_eq!(stat.size, 5);
        assert!(!stat.pinned);

        backend.pin(&cid).await.unwrap();
        assert!(backend.stat(&cid).await.unwrap().unwrap().pinned);
    }

    #[tokio::test]
    async fn add_is_idempotent_for_same_content() {
        let backend = MemoryBackend::new();
        let a = backend.add(b"same").await.unwrap();
        let b = backend.add(b"same").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(backend.len(), 1);
    }
}
