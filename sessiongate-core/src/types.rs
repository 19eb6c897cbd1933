//! Core data types for sessiongate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque unique user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Generate a fresh time-ordered identifier
    pub fn generate() -> Self {
        UserId(ulid::Ulid::new().to_string())
    }

    /// Wrap an existing identifier, rejecting empty or control-character ids
    pub fn new(id: &str) -> crate::Result<Self> {
        validate_id(id)?;
        Ok(UserId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque unique project identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn generate() -> Self {
        ProjectId(ulid::Ulid::new().to_string())
    }

    pub fn new(id: &str) -> crate::Result<Self> {
        validate_id(id)?;
        Ok(ProjectId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_id(id: &str) -> crate::Result<()> {
    if id.is_empty() {
        return Err(crate::SessionGateError::Validation("empty identifier".to_string()));
    }
    if id.chars().any(|c| c.is_control() || c == '/') {
        return Err(crate::SessionGateError::Validation(format!(
            "invalid characters in identifier '{}'",
            id.escape_default()
        )));
    }
    Ok(())
}

/// A user document as persisted in the `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    #[serde(default)]
    pub mobile_number: Option<String>,
    pub registered_date: DateTime<Utc>,
    /// PHC-format password hash
    pub password: String,
}

impl UserRecord {
    /// Credential view of this record
    pub fn credential(&self, id: UserId) -> UserCredential {
        UserCredential {
            id,
            email: self.email.clone(),
            password_hash: self.password.clone(),
        }
    }

    /// Public view of this record, without the password hash
    pub fn profile(&self, id: UserId) -> UserProfile {
        UserProfile {
            id,
            username: self.username.clone(),
            email: self.email.clone(),
            mobile_number: self.mobile_number.clone(),
        }
    }
}

/// The subset of a user the session service needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
}

/// User as returned by listing endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: Option<String>,
    pub email: String,
    pub mobile_number: Option<String>,
}

/// Registration payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A project document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub source_code: Option<String>,
}

impl Project {
    /// Apply a partial update.
    ///
    /// Missing or empty string fields keep their current value;
    /// `technologies` is replaced whenever the patch carries it.
    pub fn apply(&mut self, patch: ProjectPatch) {
        fn keep_or_replace(current: &mut Option<String>, incoming: Option<String>) {
            if let Some(value) = incoming.filter(|v| !v.is_empty()) {
                *current = Some(value);
            }
        }

        keep_or_replace(&mut self.title, patch.title);
        keep_or_replace(&mut self.description, patch.description);
        keep_or_replace(&mut self.source_code, patch.source_code);
        if let Some(technologies) = patch.technologies {
            self.technologies = technologies;
        }
    }
}

/// Partial project update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Option<Vec<String>>,
    #[serde(default)]
    pub source_code: Option<String>,
}

/// Identity attached to a request once the auth gate admits it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub subject: UserId,
}
