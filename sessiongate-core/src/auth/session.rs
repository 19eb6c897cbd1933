//! Login, logout and registration
//!
//! Store access and Argon2 work run on the blocking pool; nothing here holds
//! the revocation lock across an await.

use crate::auth::{
    unix_now, IssuedToken, PasswordHasher, RevocationRegistry, RevokeOutcome, TokenCodec,
};
use crate::config::AuthConfig;
use crate::store::CredentialStore;
use crate::{AuthErrorKind, NewUser, Result, SessionGateError, UserId, UserRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const MISSING_CREDENTIALS: &str = "Email and password are required.";
const DUPLICATE_EMAIL: &str = "Email already exists. Please choose a different email.";

pub struct SessionService<S> {
    store: Arc<S>,
    hasher: PasswordHasher,
    codec: Arc<TokenCodec>,
    registry: Arc<RevocationRegistry>,
    token_ttl: Duration,
    /// Verified against when no user matches, so unknown emails cost the same as bad passwords
    decoy_hash: String,
}

impl<S: CredentialStore> SessionService<S> {
    pub fn new(
        config: &AuthConfig,
        store: Arc<S>,
        codec: Arc<TokenCodec>,
        registry: Arc<RevocationRegistry>,
    ) -> Result<Self> {
        let hasher = PasswordHasher::new(config.password_cost())?;
        let decoy_hash = hasher.hash(&ulid::Ulid::new().to_string())?;

        Ok(SessionService {
            store,
            hasher,
            codec,
            registry,
            token_ttl: config.token_ttl(),
            decoy_hash,
        })
    }

    /// Exchange an email/password pair for an access token
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken> {
        if email.is_empty() || password.is_empty() {
            return Err(SessionGateError::Validation(MISSING_CREDENTIALS.to_string()));
        }

        let store = self.store.clone();
        let lookup_email = email.to_string();
        let matches =
            tokio::task::spawn_blocking(move || store.find_by_email(&lookup_email, 2)).await??;

        let candidate = match matches.as_slice() {
            [(id, record)] => Some(record.credential(id.clone())),
            _ => {
                debug!(matches = matches.len(), "no unique user for login email");
                None
            }
        };

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let stored_hash = candidate
            .as_ref()
            .map(|c| c.password_hash.clone())
            .unwrap_or_else(|| self.decoy_hash.clone());
        let password_ok =
            tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash)).await?;

        let credential = match candidate {
            Some(credential) if password_ok => credential,
            _ => return Err(AuthErrorKind::InvalidCredentials.into()),
        };

        let issued = self.codec.issue(&credential.id, self.token_ttl)?;
        info!(subject = %credential.id, expires_at = issued.expires_at, "login succeeded");
        Ok(issued)
    }

    /// Revoke a token.
    ///
    /// The token is not required to verify; any non-empty string is accepted
    /// into the registry.
    pub fn logout(&self, token: Option<&str>) -> Result<RevokeOutcome> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthErrorKind::MissingToken)?;

        let evict_after = match self.codec.verify(token) {
            Ok(verified) => verified.expires_at,
            Err(_) => unix_now().saturating_add(self.token_ttl.as_secs()),
        };

        let outcome = self.registry.revoke(token, evict_after);
        if outcome.already_revoked {
            debug!(
                revoked_at = ?self.registry.revoked_at(token),
                "logout of an already revoked token"
            );
        } else {
            info!(revoked = self.registry.len(), "token revoked");
        }
        Ok(outcome)
    }

    /// Create a user; the email must not belong to anyone yet
    pub async fn register(&self, new_user: NewUser) -> Result<UserId> {
        let email = new_user.email.filter(|e| !e.is_empty());
        let password = new_user.password.filter(|p| !p.is_empty());
        let (email, password) = match (email, password) {
            (Some(email), Some(password)) => (email, password),
            _ => return Err(SessionGateError::Validation(MISSING_CREDENTIALS.to_string())),
        };

        let hasher = self.hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let id = UserId::generate();
        let record = UserRecord {
            username: new_user.username,
            email,
            mobile_number: new_user.mobile_number,
            registered_date: chrono::Utc::now(),
            password: password_hash,
        };

        let store = self.store.clone();
        let insert_id = id.clone();
        let inserted =
            tokio::task::spawn_blocking(move || store.insert_if_email_absent(&insert_id, &record))
                .await??;

        if !inserted {
            debug!("registration refused, email already in use");
            return Err(SessionGateError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        info!(user_id = %id, "user registered");
        Ok(id)
    }

}
