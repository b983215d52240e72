pub mod guest_service;
pub mod pagination;
