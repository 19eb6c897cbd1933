//! Request gate: admits a request only with a live, correctly signed token

use crate::auth::{RevocationRegistry, TokenCodec, TokenRejection};
use crate::{AuthErrorKind, AuthenticatedIdentity};
use std::sync::Arc;
use tracing::{debug, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// Strip the `Bearer ` prefix from an `Authorization` header value.
///
/// A value without the prefix is taken as the raw token. Blank values yield `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix(BEARER_PREFIX).unwrap_or(header).trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    registry: Arc<RevocationRegistry>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, registry: Arc<RevocationRegistry>) -> Self {
        AuthGate { codec, registry }
    }

    /// Decide on a request given its `Authorization` header, if any
    pub fn admit(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthErrorKind> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthErrorKind::MissingToken)?;
        self.admit_token(token)
    }

    /// Decide on a bare token
    pub fn admit_token(&self, token: &str) -> Result<AuthenticatedIdentity, AuthErrorKind> {
        let verified = match self.codec.verify(token) {
            Ok(verified) => verified,
            Err(rejection) => {
                match &rejection {
                    TokenRejection::Expired => debug!("rejecting expired token"),
                    TokenRejection::BadSignature => warn!("rejecting token with bad signature"),
                    TokenRejection::Malformed(reason) => {
                        warn!(%reason, "rejecting malformed token")
                    }
                }
                return Err(AuthErrorKind::InvalidToken);
            }
        };

        if self.registry.is_revoked(token) {
            debug!(subject = %verified.subject, "rejecting revoked token");
            return Err(AuthErrorKind::RevokedToken);
        }

        Ok(AuthenticatedIdentity {
            subject: verified.subject,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::unix_now;
    use crate::config::{AuthConfig, DEFAULT_TOKEN_TTL};
    use crate::UserId;

    fn gate() -> (AuthGate, Arc<TokenCodec>, Arc<RevocationRegistry>) {
        let config =
            AuthConfig::new("gate-test-signing-key-0123456789", DEFAULT_TOKEN_TTL).unwrap();
        let codec = Arc::new(TokenCodec::new(&config));
        let registry = Arc::new(RevocationRegistry::new());
        (AuthGate::new(codec.clone(), registry.clone()), codec, registry)
    }

    #[test]
    fn test_bearer_prefix_stripping() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
        assert_eq!(bearer_token("   "), None);
    }

    #[test]
    fn test_missing_header_is_missing_token() {
        let (gate, _, _) = gate();
        assert_eq!(gate.admit(None), Err(AuthErrorKind::MissingToken));
        assert_eq!(gate.admit(Some("Bearer ")), Err(AuthErrorKind::MissingToken));
    }

    #[test]
    fn test_valid_token_is_admitted_with_identity() {
        let (gate, codec, _) = gate();
        let subject = UserId::generate();
        let issued = codec.issue(&subject, DEFAULT_TOKEN_TTL).unwrap();

        let header = format!("Bearer {}", issued.token);
        let identity = gate.admit(Some(&header)).unwrap();
        assert_eq!(identity.subject, subject);

        // raw token without the prefix also passes
        assert!(gate.admit(Some(&issued.token)).is_ok());
    }

    #[test]
    fn test_every_codec_failure_is_invalid_token() {
        let (gate, codec, _) = gate();
        let expired = codec
            .issue_at(&UserId::generate(), unix_now() - 7200, DEFAULT_TOKEN_TTL)
            .unwrap();

        let other_config =
            AuthConfig::new("some other key entirely, 32 bytes", DEFAULT_TOKEN_TTL).unwrap();
        let foreign = TokenCodec::new(&other_config)
            .issue(&UserId::generate(), DEFAULT_TOKEN_TTL)
            .unwrap();

        assert_eq!(gate.admit_token(&expired.token), Err(AuthErrorKind::InvalidToken));
        assert_eq!(gate.admit_token(&foreign.token), Err(AuthErrorKind::InvalidToken));
        assert_eq!(gate.admit_token("garbage"), Err(AuthErrorKind::InvalidToken));
    }

    #[test]
    fn test_revoked_token_is_rejected_and_gate_does_not_mutate_registry() {
        let (gate, codec, registry) = gate();
        let issued = codec.issue(&UserId::generate(), DEFAULT_TOKEN_TTL).unwrap();

        assert!(gate.admit_token(&issued.token).is_ok());
        assert!(registry.is_empty());

        registry.revoke(&issued.token, issued.expires_at);
        assert_eq!(gate.admit_token(&issued.token), Err(AuthErrorKind::RevokedToken));
        assert_eq!(gate.admit_token(&issued.token), Err(AuthErrorKind::RevokedToken));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_expired_and_revoked_reports_invalid_token() {
        let (gate, codec, registry) = gate();
        let expired = codec
            .issue_at(&UserId::generate(), unix_now() - 7200, DEFAULT_TOKEN_TTL)
            .unwrap();
        registry.revoke(&expired.token, u64::MAX);

        assert_eq!(gate.admit_token(&expired.token), Err(AuthErrorKind::InvalidToken));
    }
}
