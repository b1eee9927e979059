//! Credential store
//!
//! Persists user records keyed by email. Implementations must keep email
//! unique and serialize their read-modify-write sequences so concurrent
//! registrations never lose each other's writes.

mod json_file;
mod memory;

pub use json_file::JsonFileUserStore;
pub use memory::InMemoryUserStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Bcrypt digest. Older data files call this field `password`.
    #[serde(alias = "password")]
    pub password_hash: String,
}

/// A user that has not been assigned an id yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

impl NewUser {
    fn with_id(self, id: u64) -> User {
        User {
            id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive email lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError>;

    /// Persist a new user and return it with its generated id.
    /// Fails with `DuplicateIdentity` if the email is already taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
}

/// Next id for a collection: the current time in milliseconds, bumped past
/// the highest existing id so that ids stay unique under bursts.
/// Callers must hold the store's write lock.
fn next_id(users: &[User]) -> Result<u64, StoreError> {
    let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
    let after_highest = match users.iter().map(|u| u.id).max() {
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| StoreError::Unavailable("user id space exhausted".to_string()))?,
        None => 0,
    };
    Ok(now.max(after_highest))
}

/// Shared create logic for collection-backed stores
fn insert_unique(users: &mut Vec<User>, new_user: NewUser) -> Result<User, StoreError> {
    if users.iter().any(|u| u.email == new_user.email) {
        return Err(StoreError::DuplicateIdentity(new_user.email));
    }
    let user = new_user.with_id(next_id(users)?);
    users.push(user.clone());
    Ok(user)
}
