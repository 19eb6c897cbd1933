//! Persistence seam for user credentials
//!
//! The session service only needs two capabilities from whatever holds user
//! documents: query by the `email` field, and an insert that refuses to create
//! a second user with the same email. The second one has to be atomic in the
//! implementation; a separate read followed by a write lets two concurrent
//! registrations both succeed.

use crate::{Result, UserId, UserRecord};

pub trait CredentialStore: Send + Sync + 'static {
    /// Users whose `email` equals `email`, at most `limit` of them
    fn find_by_email(&self, email: &str, limit: usize) -> Result<Vec<(UserId, UserRecord)>>;

    /// Store `record` under `id` unless a user with the same email exists.
    ///
    /// Returns `false` without writing anything when the email is taken.
    fn insert_if_email_absent(&self, id: &UserId, record: &UserRecord) -> Result<bool>;
}
