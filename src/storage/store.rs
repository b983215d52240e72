use std::{
    path::PathBuf,
    sync::{PoisonError, RwLock},
};

use num_format::{Locale, ToFormattedString};

use crate::{consts::consts::DEFAULT_DATA_FILE, model::guest::Guest};

use super::{file::FileStorage, ReadBlobState, Storage, StorageError, StorageResult};

/// What happens when rewriting the backing file fails
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteMode {
    /// Log the failure and keep the guest in memory
    BestEffort,
    /// Roll the in-memory append back and return the error
    Strict,
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub data_file: PathBuf,
    pub write_mode: WriteMode,
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
impl StoreOptions {
    pub fn set_data_file(mut self, data_file: PathBuf) -> Self {
        self.data_file = data_file;
        self
    }

    /// Defines whether a failed file write is surfaced to the caller, or only logged
    pub fn set_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        // Defaults to $CWD/guests.json
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            write_mode: WriteMode::BestEffort,
        }
    }
}

/// In-memory guest list, mirrored to storage on every write.
///
/// Writers hold the write lock for the append and the full rewrite, so the
/// backing blob is never torn. Readers take the read lock and copy out.
///
/// Duplicate detection is a linear scan over every stored guest. Guest lists
/// are expected to be small, if that changes index the lowercased identity
/// triple in a `HashSet` next to the list.
pub struct GuestStore {
    guests: RwLock<Vec<Guest>>,
    storage: Box<dyn Storage + Send + Sync>,
    write_mode: WriteMode,
}

impl GuestStore {
    pub fn new(options: StoreOptions) -> Self {
        Self::with_storage(
            Box::new(FileStorage::new(options.data_file)),
            options.write_mode,
        )
    }

    pub fn with_storage(storage: Box<dyn Storage + Send + Sync>, write_mode: WriteMode) -> Self {
        Self {
            guests: RwLock::new(vec![]),
            storage,
            write_mode,
        }
    }

    /// Best-effort restore from storage. Any failure leaves the list untouched.
    pub fn load(&self) -> usize {
        if let Err(e) = self.storage.init() {
            log::warn!("Storage init failed, starting with no guests: {}", e);
            return 0;
        }

        let loaded = match self.read_guests() {
            Ok(guests) => guests,
            Err(e) => {
                log::warn!("Unable to load guests, starting with no guests: {}", e);
                return 0;
            }
        };

        let count = loaded.len();

        *self.guests.write().unwrap_or_else(PoisonError::into_inner) = loaded;

        log::info!(
            "📀 Loaded guests [Count: {}]",
            count.to_formatted_string(&Locale::en)
        );

        count
    }

    /// Appends the guest and rewrites storage with the whole list
    pub fn save(&self, guest: Guest) -> StorageResult<()> {
        let mut guests = self.guests.write().unwrap_or_else(PoisonError::into_inner);

        self.append_and_persist(&mut guests, guest)
    }

    /// Same as `save`, but refuses the guest if its identity triple is already
    /// stored. The check and the append happen under one lock.
    pub fn save_unique(&self, guest: Guest) -> StorageResult<Guest> {
        let mut guests = self.guests.write().unwrap_or_else(PoisonError::into_inner);

        if guests.iter().any(|existing| existing.same_identity(&guest)) {
            return Err(StorageError::Duplicate);
        }

        self.append_and_persist(&mut guests, guest.clone())?;

        Ok(guest)
    }

    pub fn get_all(&self) -> Vec<Guest> {
        self.guests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.guests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_guests(&self) -> StorageResult<Vec<Guest>> {
        match self.storage.read_blob()? {
            ReadBlobState::Found(bytes) => {
                serde_json::from_slice(&bytes).map_err(StorageError::UnableToDeserialize)
            }
            ReadBlobState::NotFound => Ok(vec![]),
        }
    }

    fn append_and_persist(&self, guests: &mut Vec<Guest>, guest: Guest) -> StorageResult<()> {
        guests.push(guest);

        let result = serde_json::to_vec(&*guests)
            .map_err(StorageError::UnableToSerialize)
            .and_then(|bytes| self.storage.write_blob(&bytes));

        match (result, self.write_mode) {
            (Ok(()), _) => Ok(()),
            (Err(e), WriteMode::BestEffort) => {
                log::warn!("Guest kept in memory only, write failed: {}", e);
                Ok(())
            }
            (Err(e), WriteMode::Strict) => {
                guests.pop();
                Err(e)
            }
        }
    }
}
