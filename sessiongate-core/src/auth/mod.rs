//! Authentication and session authorization
//!
//! - Argon2id password hashing
//! - HS256 access tokens with distinct rejection kinds
//! - In-memory revocation registry with expiry-based eviction
//! - The request gate and the login/logout/registration service

pub mod gate;
pub mod password;
pub mod revocation;
pub mod session;
pub mod token;

pub use gate::*;
pub use password::*;
pub use revocation::*;
pub use session::*;
pub use token::*;
