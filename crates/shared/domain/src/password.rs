//! Password value object.
//!
//! Hashing and verification use Argon2 with default parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Hashed password. Never exposes the hash through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a plain-text password after checking the length policy.
    ///
    /// # Errors
    /// Returns `DomainError::Password` if the length is outside the allowed range.
    pub fn new(plain_text: &str) -> DomainResult<Self> {
        let length = plain_text.chars().count() as u64;
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
            return Err(DomainError::password(format!(
                "Password must be between {} and {} characters",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::internal(format!("Password hash failed: {}", e)))?
            .to_string();

        Ok(Self { hash })
    }

    /// Wrap a hash loaded from storage.
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Check a plain-text candidate. A malformed stored hash never verifies.
    pub fn verify(&self, plain_text: &str) -> bool {
        PasswordHash::new(&self.hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(plain_text.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let password = Password::new("s3cret").unwrap();
        assert!(password.verify("s3cret"));
        assert!(!password.verify("s3cret!"));
    }

    #[test]
    fn test_password_from_hash() {
        let hash = Password::new("pass123").unwrap().into_string();
        assert!(Password::from_hash(hash).verify("pass123"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let a = Password::new("samepass").unwrap();
        let b = Password::new("samepass").unwrap();
        assert_ne!(a.as_str(), b.as_str());
        assert!(a.verify("samepass"));
        assert!(b.verify("samepass"));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(Password::new("abcd").is_err());
        assert!(Password::new("abcde").is_ok());
        assert!(Password::new(&"x".repeat(20)).is_ok());
        assert!(matches!(
            Password::new(&"x".repeat(21)),
            Err(DomainError::Password(_))
        ));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!Password::from_hash("not-a-hash".into()).verify("anything"));
    }
}
