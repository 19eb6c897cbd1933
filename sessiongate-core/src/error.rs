//! Error types for sessiongate

use serde::Serialize;
use thiserror::Error;

/// The four ways authentication can fail. All of them surface as 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AuthErrorKind {
    MissingToken,
    InvalidToken,
    RevokedToken,
    InvalidCredentials,
}

impl AuthErrorKind {
    /// Stable machine-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::MissingToken => "MissingToken",
            AuthErrorKind::InvalidToken => "InvalidToken",
            AuthErrorKind::RevokedToken => "RevokedToken",
            AuthErrorKind::InvalidCredentials => "InvalidCredentials",
        }
    }

    /// Human message shown to clients
    pub fn message(&self) -> &'static str {
        match self {
            AuthErrorKind::MissingToken => "Access denied. Token missing.",
            AuthErrorKind::InvalidToken => "Access denied. Invalid token.",
            AuthErrorKind::RevokedToken => "Access denied. Token has been revoked.",
            AuthErrorKind::InvalidCredentials => "Invalid Credentials",
        }
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Error, Debug)]
pub enum SessionGateError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(AuthErrorKind),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionGateError {
    /// Stable kind reported to clients alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            SessionGateError::Validation(_) => "ValidationError",
            SessionGateError::Auth(kind) => kind.as_str(),
            SessionGateError::Conflict(_) => "ConflictError",
            SessionGateError::NotFound(_) => "NotFoundError",
            SessionGateError::Config(_)
            | SessionGateError::Storage(_)
            | SessionGateError::Serialization(_)
            | SessionGateError::Io(_)
            | SessionGateError::Internal(_) => "InternalError",
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            SessionGateError::Validation(_) => 400,
            SessionGateError::Auth(_) => 401,
            SessionGateError::NotFound(_) => 404,
            SessionGateError::Conflict(_) => 409,
            _ => 500,
        }
    }

    /// Message that is safe to hand to a client.
    ///
    /// Internal failures collapse to a fixed string; their detail goes to the log only.
    pub fn public_message(&self) -> String {
        match self.status_code() {
            500 => "Something went wrong.".to_string(),
            _ => self.to_string(),
        }
    }

    /// The authentication failure kind, if this is one
    pub fn auth_kind(&self) -> Option<AuthErrorKind> {
        match self {
            SessionGateError::Auth(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<AuthErrorKind> for SessionGateError {
    fn from(kind: AuthErrorKind) -> Self {
        SessionGateError::Auth(kind)
    }
}

impl From<tokio::task::JoinError> for SessionGateError {
    fn from(err: tokio::task::JoinError) -> Self {
        SessionGateError::Internal(format!("blocking task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(SessionGateError::Validation("x".into()).status_code(), 400);
        assert_eq!(SessionGateError::Auth(AuthErrorKind::RevokedToken).status_code(), 401);
        assert_eq!(SessionGateError::NotFound("x".into()).status_code(), 404);
        assert_eq!(SessionGateError::Conflict("x".into()).status_code(), 409);
        assert_eq!(SessionGateError::Storage("disk on fire".into()).status_code(), 500);
    }

    #[test]
    fn test_internal_detail_is_not_public() {
        let err = SessionGateError::Storage("partition users_main poisoned".into());
        assert_eq!(err.kind(), "InternalError");
        assert!(!err.public_message().contains("poisoned"));
    }

    #[test]
    fn test_auth_kinds_share_status_but_not_kind() {
        let missing = SessionGateError::from(AuthErrorKind::MissingToken);
        let creds = SessionGateError::from(AuthErrorKind::InvalidCredentials);
        assert_eq!(missing.status_code(), creds.status_code());
        assert_eq!(missing.kind(), "MissingToken");
        assert_eq!(creds.kind(), "InvalidCredentials");
        assert_eq!(creds.public_message(), "Invalid Credentials");
    }
}
