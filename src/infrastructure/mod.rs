pub mod config;
pub mod credential_store;
pub mod error;
pub mod identity;
pub mod session_store;
