pub mod backend;
pub mod error;
pub mod init;
pub mod store;

pub use backend::fs::FsBackend;
pub use backend::memory::MemoryBackend;
pub use backend::{BackendError, BlockStat, ByteStream, CasBackend, ContentId};
pub use error::StoreError;
pub use init::InitCell;
pub use store::{SecureBlobStore, StoredBlob};
