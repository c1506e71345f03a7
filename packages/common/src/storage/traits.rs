use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::hash::ContentHash;

pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Hash and byte length of a blob that was just written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredBlob {
    pub hash: ContentHash,
    pub size: u64,
}

/// Content-addressed storage for uploaded media.
///
/// Writing identical bytes twice yields the same hash and keeps a single
/// copy.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Drain `reader` into the store.
    async fn put_stream(&self, reader: BoxReader) -> Result<StoredBlob, StorageError>;

    async fn open(&self, hash: &ContentHash) -> Result<BoxReader, StorageError>;

    async fn contains(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Returns `false` when there was nothing to remove.
    async fn remove(&self, hash: &ContentHash) -> Result<bool, StorageError>;
}
