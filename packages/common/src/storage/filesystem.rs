use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{BlobStore, BoxReader, StoredBlob};

const READ_CHUNK: usize = 64 * 1024;

/// Blob store rooted at a local directory.
///
/// Layout: `{root}/{first byte as hex}/{remaining 31 bytes as hex}`.
/// Writes land in `{root}/.incoming` first and are renamed into place, so a
/// reader never observes a half-written blob.
pub struct FilesystemBlobStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(root.join(".incoming")).await?;
        Ok(Self { root, max_size })
    }

    fn path_for(&self, hash: &ContentHash) -> PathBuf {
        let (dir, file) = hash.shard();
        self.root.join(dir).join(file)
    }

    fn incoming_path(&self) -> PathBuf {
        self.root
            .join(".incoming")
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn write_incoming(
        &self,
        reader: &mut BoxReader,
        path: &PathBuf,
    ) -> Result<StoredBlob, StorageError> {
        let mut file = fs::File::create(path).await?;
        let mut hasher = Sha256::new();
        let mut size: u64 = 0;
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            size += n as u64;
            if size > self.max_size {
                return Err(StorageError::TooLarge {
                    actual: size,
                    limit: self.max_size,
                });
            }
            hasher.update(&buf[..n]);
            file.write_all(&buf[..n]).await?;
        }
        file.flush().await?;

        Ok(StoredBlob {
            hash: ContentHash::from_digest(hasher.finalize().into()),
            size,
        })
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(&self, mut reader: BoxReader) -> Result<StoredBlob, StorageError> {
        let incoming = self.incoming_path();

        let blob = match self.write_incoming(&mut reader, &incoming).await {
            Ok(blob) => blob,
            Err(e) => {
                let _ = fs::remove_file(&incoming).await;
                return Err(e);
            }
        };

        let target = self.path_for(&blob.hash);
        if fs::try_exists(&target).await? {
            debug!(hash = %blob.hash, "blob already stored");
            let _ = fs::remove_file(&incoming).await;
            return Ok(blob);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Err(e) = fs::rename(&incoming, &target).await {
            let _ = fs::remove_file(&incoming).await;
            return Err(e.into());
        }

        Ok(blob)
    }

    async fn open(&self, hash: &ContentHash) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.path_for(hash)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(hash.to_hex())),
            Err(e) => Err(e.into()),
        }
    }

    async fn contains(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.path_for(hash)).await?)
    }

    async fn remove(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        match fs::remove_file(self.path_for(hash)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
