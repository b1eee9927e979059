/// Password Hashing and Verification
///
/// Salted bcrypt digests with a configurable work factor. Both functions are
/// CPU-bound; async callers run them on the blocking pool.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// Work-factor bounds bcrypt accepts
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Hash a password with a fresh random salt at the given bcrypt cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored digest.
///
/// Fails closed: a malformed digest yields `false`, never an error.
pub fn verify_password(password: &str, digest: &str) -> bool {
    match verify(password, digest) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password digest could not be parsed");
            false
        }
    }
}
