//! The `users` collection

use serde_json::Value;
use sessiongate_core::*;
use std::sync::Arc;

use crate::{Collection, StorageEngine};

pub const USERS_COLLECTION: &str = "users";
const EMAIL_FIELD: &str = "email";

#[derive(Clone)]
pub struct UserStore {
    users: Arc<Collection>,
}

impl UserStore {
    pub fn new(engine: &StorageEngine) -> Result<Self> {
        Ok(UserStore {
            users: Arc::new(engine.collection(USERS_COLLECTION)?),
        })
    }

    /// Every user, without password hashes
    pub fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        self.users
            .list::<UserRecord>()?
            .into_iter()
            .map(|(id, record)| Ok(record.profile(UserId::new(&id)?)))
            .collect()
    }
}

impl CredentialStore for UserStore {
    fn find_by_email(&self, email: &str, limit: usize) -> Result<Vec<(UserId, UserRecord)>> {
        self.users
            .query_by_field::<UserRecord>(EMAIL_FIELD, &Value::String(email.to_string()), limit)?
            .into_iter()
            .map(|(id, record)| Ok((UserId::new(&id)?, record)))
            .collect()
    }

    fn insert_if_email_absent(&self, id: &UserId, record: &UserRecord) -> Result<bool> {
        self.users.insert_unique(id.as_str(), record, EMAIL_FIELD)
    }
}
