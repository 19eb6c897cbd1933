//! Bearer token codec
//!
//! Access tokens are HS256 JWTs carrying the user id in `sub` plus `iat`/`exp`.
//! Verification runs with zero clock tolerance and reports why a token was
//! refused so the gate can log it, even though clients only ever see 401.

use crate::{config::AuthConfig, Result, SessionGateError, UserId};
use jwt_simple::prelude::{
    Claims, Duration as JwtDuration, HS256Key, MACLike, NoCustomClaims, VerificationOptions,
};
use jwt_simple::JWTError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Why a token was not accepted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

/// A freshly minted token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub subject: UserId,
    pub issued_at: u64,
    pub expires_at: u64,
}

/// Claims recovered from a token that passed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: UserId,
    pub issued_at: Option<u64>,
    pub expires_at: u64,
}

pub struct TokenCodec {
    key: HS256Key,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        TokenCodec {
            key: HS256Key::from_bytes(config.signing_key()),
        }
    }

    /// Issue a token for `subject` valid for `ttl` from now
    pub fn issue(&self, subject: &UserId, ttl: Duration) -> Result<IssuedToken> {
        self.issue_at(subject, unix_now(), ttl)
    }

    /// Issue a token as if the current time were `issued_at` (unix seconds)
    pub fn issue_at(&self, subject: &UserId, issued_at: u64, ttl: Duration) -> Result<IssuedToken> {
        let expires_at = issued_at.saturating_add(ttl.as_secs());

        let mut claims =
            Claims::create(JwtDuration::from_secs(ttl.as_secs())).with_subject(subject.as_str());
        claims.issued_at = Some(JwtDuration::from_secs(issued_at));
        claims.invalid_before = Some(JwtDuration::from_secs(issued_at));
        claims.expires_at = Some(JwtDuration::from_secs(expires_at));

        let token = self
            .key
            .authenticate(claims)
            .map_err(|e| SessionGateError::Internal(format!("token signing failed: {}", e)))?;

        Ok(IssuedToken {
            token,
            subject: subject.clone(),
            issued_at,
            expires_at,
        })
    }

    /// Check structure, signature and expiry of a token
    pub fn verify(&self, token: &str) -> std::result::Result<VerifiedToken, TokenRejection> {
        let options = VerificationOptions {
            time_tolerance: Some(JwtDuration::from_secs(0)),
            ..Default::default()
        };

        let claims = self
            .key
            .verify_token::<NoCustomClaims>(token, Some(options))
            .map_err(classify)?;

        let subject = claims
            .subject
            .ok_or_else(|| TokenRejection::Malformed("missing subject".to_string()))?;
        let subject = UserId::new(&subject)
            .map_err(|_| TokenRejection::Malformed("invalid subject".to_string()))?;
        let expires_at = claims
            .expires_at
            .ok_or_else(|| TokenRejection::Malformed("missing expiry".to_string()))?
            .as_secs();

        Ok(VerifiedToken {
            subject,
            issued_at: claims.issued_at.map(|t| t.as_secs()),
            expires_at,
        })
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

fn classify(err: jwt_simple::Error) -> TokenRejection {
    match err.downcast_ref::<JWTError>() {
        Some(JWTError::TokenHasExpired) => TokenRejection::Expired,
        Some(JWTError::InvalidAuthenticationTag)
        | Some(JWTError::InvalidSignature)
        | Some(JWTError::AlgorithmMismatch) => TokenRejection::BadSignature,
        _ => TokenRejection::Malformed(err.to_string()),
    }
}

/// Current wall-clock time in unix seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TOKEN_TTL;

    fn codec_with_key(key: &str) -> TokenCodec {
        TokenCodec::new(&AuthConfig::new(key, DEFAULT_TOKEN_TTL).unwrap())
    }

    fn codec() -> TokenCodec {
        codec_with_key("0123456789abcdef0123456789abcdef")
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let codec = codec();
        let subject = UserId::generate();

        let issued = codec.issue(&subject, DEFAULT_TOKEN_TTL).unwrap();
        assert_eq!(issued.expires_at - issued.issued_at, 3600);

        let verified = codec.verify(&issued.token).unwrap();
        assert_eq!(verified.subject, subject);
        assert_eq!(verified.expires_at, issued.expires_at);
        assert_eq!(verified.issued_at, Some(issued.issued_at));
    }

    #[test]
    fn test_expired_token_is_rejected_as_expired() {
        let codec = codec();
        let subject = UserId::generate();

        let two_hours_ago = unix_now() - 7200;
        let issued = codec.issue_at(&subject, two_hours_ago, DEFAULT_TOKEN_TTL).unwrap();

        assert_eq!(codec.verify(&issued.token), Err(TokenRejection::Expired));
    }

    #[test]
    fn test_token_from_other_key_has_bad_signature() {
        let ours = codec();
        let theirs = codec_with_key("a completely different signing key");
        let issued = theirs.issue(&UserId::generate(), DEFAULT_TOKEN_TTL).unwrap();

        assert_eq!(ours.verify(&issued.token), Err(TokenRejection::BadSignature));
    }

    #[test]
    fn test_swapped_payload_has_bad_signature() {
        let codec = codec();
        let alice = codec.issue(&UserId::new("alice").unwrap(), DEFAULT_TOKEN_TTL).unwrap();
        let mallory = codec.issue(&UserId::new("mallory").unwrap(), DEFAULT_TOKEN_TTL).unwrap();

        let a: Vec<&str> = alice.token.split('.').collect();
        let m: Vec<&str> = mallory.token.split('.').collect();
        assert_eq!(a.len(), 3);

        let forged = format!("{}.{}.{}", a[0], m[1], a[2]);
        assert_eq!(codec.verify(&forged), Err(TokenRejection::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        for garbage in ["", "abc", "a.b.c", "not a token at all", "Bearer "] {
            match codec.verify(garbage) {
                Err(TokenRejection::Malformed(_)) => {}
                other => panic!("expected Malformed for {:?}, got {:?}", garbage, other),
            }
        }
    }

    #[test]
    fn test_token_without_subject_is_malformed() {
        let codec = codec();
        let claims = Claims::create(JwtDuration::from_secs(60));
        let token = codec.key.authenticate(claims).unwrap();

        match codec.verify(&token) {
            Err(TokenRejection::Malformed(reason)) => assert!(reason.contains("subject")),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }
}
