//! Password hashing (argon2, PHC string format)

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rentals_core::{ErrorContext, RentalsError, RentalsResult};
use tracing::warn;

/// Hash a cleartext password with a fresh random salt
pub fn hash_password(password: &str) -> RentalsResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RentalsError::Internal {
            message: format!("Failed to hash password: {}", e),
            source: None,
            context: ErrorContext::new("password").with_operation("hash"),
        })
}

/// Check a cleartext password against a stored hash.
/// A hash that cannot be parsed never verifies.
pub fn verify_password(hash: &str, password: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Stored password hash is not a valid PHC string: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
