//! Storage abstraction trait

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage key already in use: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked download stream
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// Every method is a suspension point; implementations must not block the runtime.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `storage_key`, refusing to overwrite an existing object.
    /// Returns the number of bytes written.
    async fn put(&self, storage_key: &str, data: &[u8]) -> StorageResult<u64>;

    /// Read at most `max_len` bytes from the start of an object
    async fn read_header(&self, storage_key: &str, max_len: usize) -> StorageResult<Vec<u8>>;

    /// Stream an object in chunks
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Delete an object; deleting a missing object is not an error
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Size in bytes of an existing object
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;
}
