use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::{
    consts::consts::{ErrorString, EMAIL_PATTERN},
    model::guest::{Guest, GuestCount, GuestPage},
    storage::{store::GuestStore, StorageError},
};

use super::pagination::Pagination;

#[derive(Error, Debug)]
pub enum GuestServiceError {
    #[error("{0}")]
    BadRequest(ErrorString),

    #[error("Invalid request method")]
    MethodNotAllowed,

    #[error("{0}")]
    Conflict(ErrorString),

    #[error("Unable to persist guest: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for GuestServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate => GuestServiceError::Conflict(err.to_string()),
            _ => GuestServiceError::Storage(err),
        }
    }
}

pub type GuestServiceResult<T> = Result<T, GuestServiceError>;

/// Validation, deduplication, pagination and search on top of the guest store
#[derive(Clone)]
pub struct GuestService {
    store: Arc<GuestStore>,
    email_regex: Regex,
}

impl GuestService {
    pub fn new(store: Arc<GuestStore>) -> Self {
        Self {
            store,
            email_regex: Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"),
        }
    }

    /// Loads previously registered guests from storage
    pub fn initialize_storage(&self) -> usize {
        self.store.load()
    }

    /// Parses, validates and stores a guest from a JSON request body
    pub fn register(&self, payload: &[u8]) -> GuestServiceResult<Guest> {
        // Only the first JSON value is read, anything after it is ignored
        let guest: Guest = serde_json::Deserializer::from_slice(payload)
            .into_iter::<Guest>()
            .next()
            .and_then(Result::ok)
            .ok_or_else(|| GuestServiceError::BadRequest("Invalid payload".to_string()))?;

        self.validate(&guest)?;

        // Duplicate check runs under the store's write lock
        let guest = self.store.save_unique(guest)?;

        log::info!("Registered guest [Total: {}]", self.store.len());

        Ok(guest)
    }

    pub fn list(&self, pagination: Pagination) -> GuestPage {
        let guests = self.store.get_all();
        let (start, end) = pagination.window(guests.len());

        GuestPage {
            page: pagination.page,
            limit: pagination.limit,
            total: guests.len(),
            guests: guests[start..end].to_vec(),
        }
    }

    pub fn count(&self) -> GuestCount {
        GuestCount {
            total: self.store.len(),
        }
    }

    /// Guests whose first or last name contains `name`, ignoring case
    pub fn search(&self, name: Option<&str>) -> GuestServiceResult<Vec<Guest>> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(GuestServiceError::BadRequest(
                    "Name query parameter is required".to_string(),
                ))
            }
        };

        Ok(self
            .store
            .get_all()
            .into_iter()
            .filter(|guest| guest.name_contains(name))
            .collect())
    }

    fn validate(&self, guest: &Guest) -> GuestServiceResult<()> {
        let required = [
            (&guest.first_name, "First name is required"),
            (&guest.last_name, "Last name is required"),
            (&guest.email, "Email is required"),
        ];

        for (value, message) in required {
            if value.trim().is_empty() {
                return Err(GuestServiceError::BadRequest(message.to_string()));
            }
        }

        if !self.is_valid_email(&guest.email) {
            return Err(GuestServiceError::BadRequest(
                "Invalid email address format".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_valid_email(&self, email: &str) -> bool {
        self.email_regex.is_match(email)
    }
}
