//! Password hashing and verification using Argon2

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use std::sync::OnceLock;

use crate::error::{AuthError, AuthResult};

/// Hash a plaintext password with a fresh random salt (PHC string format).
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a plaintext password against a stored PHC hash.
///
/// `Ok(false)` means mismatch; `Err` means the stored hash is unusable.
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("Failed to parse password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Internal(format!("Failed to verify password: {}", e))),
    }
}

/// Burns the same work as a real verification when no user matched,
/// so response time does not reveal whether an email is registered.
pub fn verify_against_dummy(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let dummy = DUMMY_HASH.get_or_init(|| hash_password("dummy-password-for-timing").ok());
    if let Some(hash) = dummy {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("Tr1cky!pass").unwrap();
        assert!(verify_password("Tr1cky!pass", &hash).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("Tr1cky!pass").unwrap();
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let first = hash_password("same-input").unwrap();
        let second = hash_password("same-input").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(verify_password("pw", "not-a-hash").is_err());
    }
}
