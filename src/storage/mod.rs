use thiserror::Error;

pub mod file;
pub mod store;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, PartialEq)]
pub enum ReadBlobState {
    Found(Vec<u8>),
    NotFound,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unable to initialize storage: {0}")]
    UnableToInitializeStorage(std::io::Error),

    #[error("Unable to read blob: {0}")]
    UnableToReadBlob(std::io::Error),

    #[error("Unable to write blob: {0}")]
    UnableToWriteBlob(std::io::Error),

    #[error("Unable to serialize guests: {0}")]
    UnableToSerialize(serde_json::Error),

    #[error("Unable to deserialize guests: {0}")]
    UnableToDeserialize(serde_json::Error),

    #[error("A guest with the same name and email already exists")]
    Duplicate,
}

/// Raw byte access to wherever the guest list is kept.
///
/// The store above this trait owns serialization and locking, implementations
/// only move bytes.
pub trait Storage {
    // Called on start-up, should be idempotent
    fn init(&self) -> StorageResult<()>;
    fn read_blob(&self) -> StorageResult<ReadBlobState>;
    /// Replaces the whole blob
    fn write_blob(&self, bytes: &[u8]) -> StorageResult<()>;
}
