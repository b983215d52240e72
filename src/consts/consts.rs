// Types
pub type ErrorString = String;

// Values
pub const DEFAULT_DATA_FILE: &str = "guests.json";
pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

/// `local@domain.tld`, where the top-level label is at least two letters
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Largest accepted `/register` body, larger bodies get 413
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;
