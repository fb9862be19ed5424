//! Filesystem backend: blocks as content-named files, pins as marker files.
//!
//! Layout:
//! - `{root}/blocks/{hex_cid}` — block bytes
//! - `{root}/pins/{hex_cid}`   — empty marker; pinned blocks survive `gc`

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncReadExt;

use super::{BackendError, BlockStat, ByteStream, CasBackend, ContentId};

/// Chunk size for streaming block files.
const CAT_CHUNK_SIZE: usize = 64 * 1024;

/// Directory-backed [`CasBackend`].
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Open a backend rooted at `root`, creating the directory layout.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let root = root.into();
        fs::create_dir_all(root.join("blocks")).await?;
        fs::create_dir_all(root.join("pins")).await?;
        Ok(Self { root })
    }

    fn block_path(&self, cid: &ContentId) -> PathBuf {
        self.root.join("blocks").join(cid.as_str())
    }

    fn pin_path(&self, cid: &ContentId) -> PathBuf {
        self.root.join("pins").join(cid.as_str())
    }

    /// Remove unpinned blocks. Returns the number of blocks purged.
    pub async fn gc(&self) -> Result<usize, BackendError> {
        let mut purged = 0;
        let mut entries = fs::read_dir(self.root.join("blocks")).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Skip temp files and anything else that is not a block
            let Ok(cid) = ContentId::parse(name) else {
                continue;
            };
            if fs::try_exists(self.pin_path(&cid)).await? {
                continue;
            }
            fs::remove_file(entry.path()).await?;
            purged += 1;
        }
        tracing::debug!(purged, "garbage collected unpinned blocks");
        Ok(purged)
    }
}

#[async_trait]
impl CasBackend for FsBackend {
    async fn add(&self, bytes: &[u8]) -> Result<ContentId, BackendError> {
        let cid = ContentId::for_bytes(bytes);
        let path = self.block_path(&cid);
        if !fs::try_exists(&path).await? {
            // Write to a temp name first so a crash never leaves a
            // truncated block under its final address.
            let tmp = path.with_extension("tmp");
            fs::write(&tmp, bytes).await?;
            fs::rename(&tmp, &path).await?;
            tracing::debug!(cid = %cid, size = bytes.len(), "stored block");
        }
        Ok(cid)
    }

    async fn cat(&self, cid: &ContentId) -> Result<ByteStream, BackendError> {
        let file = match fs::File::open(self.block_path(cid)).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BackendError::NotFound(cid.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let stream = futures::stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; CAT_CHUNK_SIZE];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                Ok(None)
            } else {
                buf.truncate(n);
                Ok(Some((Bytes::from(buf), file)))
            }
        });
        Ok(Box::pin(stream))
    }

    async fn pin(&self, cid: &ContentId) -> Result<(), BackendError> {
        if !fs::try_exists(self.block_path(cid)).await? {
            return Err(BackendError::NotFound(cid.clone()));
        }
        fs::write(self.pin_path(cid), b"").await?;
        Ok(())
    }

    async fn stat(&self, cid: &ContentId) -> Result<Option<BlockStat>, BackendError> {
        let size = match fs::metadata(self.block_path(cid)).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let pinned = fs::try_exists(self.pin_path(cid)).await?;
        Ok(Some(BlockStat { size, pinned }))
    }
}
