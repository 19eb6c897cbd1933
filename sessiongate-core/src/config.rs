//! Authentication configuration, built once at startup

use crate::{Result, SessionGateError};
use std::fmt;
use std::time::Duration;

/// Default lifetime of an access token
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Signing keys shorter than this are accepted but logged as weak
pub const RECOMMENDED_KEY_LEN: usize = 32;

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl PasswordCost {
    /// Smallest cost argon2 accepts. Only suitable for tests.
    pub const fn minimal() -> Self {
        PasswordCost {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for PasswordCost {
    fn default() -> Self {
        PasswordCost {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

/// Process-wide authentication settings
#[derive(Clone)]
pub struct AuthConfig {
    signing_key: Vec<u8>,
    token_ttl: Duration,
    password_cost: PasswordCost,
}

impl AuthConfig {
    pub fn new(signing_key: impl Into<Vec<u8>>, token_ttl: Duration) -> Result<Self> {
        let signing_key = signing_key.into();
        if signing_key.is_empty() {
            return Err(SessionGateError::Config("signing key must not be empty".to_string()));
        }
        if token_ttl.as_secs() == 0 {
            return Err(SessionGateError::Config(
                "token lifetime must be at least one second".to_string(),
            ));
        }
        if signing_key.len() < RECOMMENDED_KEY_LEN {
            tracing::warn!(
                key_len = signing_key.len(),
                "signing key is shorter than {} bytes",
                RECOMMENDED_KEY_LEN
            );
        }

        Ok(AuthConfig {
            signing_key,
            token_ttl,
            password_cost: PasswordCost::default(),
        })
    }

    pub fn with_password_cost(mut self, cost: PasswordCost) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn password_cost(&self) -> PasswordCost {
        self.password_cost
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_key", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("password_cost", &self.password_cost)
            .finish()
    }
}
