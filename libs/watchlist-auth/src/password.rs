//! bcrypt password hashes.

use crate::error::PasswordError;

/// Hash `password` with bcrypt at `cost`. Every call uses a fresh salt.
///
/// # Errors
/// Returns `PasswordError::Empty` for an empty password and
/// `PasswordError::Hash` when bcrypt rejects the cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    Ok(bcrypt::hash(password, cost)?)
}

/// Whether `password` matches `hash`. A malformed hash never matches.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}
