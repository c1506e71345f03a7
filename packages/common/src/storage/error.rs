/// Errors raised by a [`BlobStore`](super::BlobStore).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No blob is stored under the requested hash.
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The hash string could not be parsed.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    /// The incoming stream grew past the store's size limit.
    #[error("upload exceeds size limit ({actual} > {limit} bytes)")]
    TooLarge { actual: u64, limit: u64 },
}

impl StorageError {
    /// True when the caller supplied something bad rather than the store failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidHash(_) | Self::TooLarge { .. })
    }
}
