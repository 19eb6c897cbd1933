//! Core data models, configuration and the authentication core for sessiongate

pub mod auth;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::*;
pub use error::*;
pub use store::CredentialStore;
pub use types::*;

/// Result type alias for sessiongate operations
pub type Result<T> = std::result::Result<T, SessionGateError>;
