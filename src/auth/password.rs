use bcrypt::{hash, verify};

use crate::error::{AppError, AppResult};

/// Hash a password with bcrypt at the given cost.
///
/// CPU-bound; call from `spawn_blocking` on the request path.
pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored bcrypt hash.
///
/// A hash that cannot be parsed (e.g. the placeholder on demo accounts)
/// never matches.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}
