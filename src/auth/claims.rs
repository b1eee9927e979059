/// Token claim set
///
/// Access and refresh tokens carry the same shape. Every field is required
/// on decode, so a token signed with the right key but missing `id` or
/// `email` is rejected rather than producing a half-filled identity.

use serde::{Deserialize, Serialize};

/// The identity a token is issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: u64,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject user id
    pub id: u64,
    /// Subject email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    /// Claims for `identity` expiring `expiry_seconds` from now
    pub fn new(identity: &Identity, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: identity.id,
            email: identity.email.clone(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer.to_string(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
        }
    }
}
