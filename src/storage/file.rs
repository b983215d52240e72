use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Write},
    path::PathBuf,
};

use super::{ReadBlobState, Storage, StorageError, StorageResult};

/// Keeps the guest list in a single JSON file
pub struct FileStorage {
    file_path: PathBuf,
}

impl FileStorage {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn file_path(&self) -> &PathBuf {
        &self.file_path
    }
}

impl Storage for FileStorage {
    fn init(&self) -> StorageResult<()> {
        match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(StorageError::UnableToInitializeStorage)
            }
            _ => Ok(()),
        }
    }

    fn read_blob(&self) -> StorageResult<ReadBlobState> {
        let mut file = match File::open(&self.file_path) {
            Ok(file) => file,
            Err(err) => match err.kind() {
                std::io::ErrorKind::NotFound => return Ok(ReadBlobState::NotFound),
                _ => return Err(StorageError::UnableToReadBlob(err)),
            },
        };

        let mut buf = Vec::new();

        file.read_to_end(&mut buf)
            .map_err(StorageError::UnableToReadBlob)?;

        Ok(ReadBlobState::Found(buf))
    }

    fn write_blob(&self, bytes: &[u8]) -> StorageResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.file_path)
            .map_err(StorageError::UnableToWriteBlob)?;

        file.write_all(bytes).map_err(StorageError::UnableToWriteBlob)
    }
}
