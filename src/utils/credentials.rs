// src/utils/credentials.rs

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

/// How student passwords are stored and checked.
pub trait CredentialCheck: Send + Sync {
    /// Turns a raw password into the value written to the database.
    fn protect(&self, password: &str) -> Result<String, AppError>;

    fn verify(&self, password: &str, stored: &str) -> Result<bool, AppError>;
}

/// Argon2 hashes with a random salt.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Credentials;

impl CredentialCheck for Argon2Credentials {
    fn protect(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?
            .to_string();

        Ok(password_hash)
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool, AppError> {
        let parsed_hash =
            PasswordHash::new(stored).map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);

        Ok(result.is_ok())
    }
}

/// Stores passwords verbatim. Only for databases migrated from the legacy
/// portal, which kept plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextCredentials;

impl CredentialCheck for PlainTextCredentials {
    fn protect(&self, password: &str) -> Result<String, AppError> {
        Ok(password.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool, AppError> {
        Ok(password == stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argon2_round_trip() {
        let creds = Argon2Credentials;
        let stored = creds.protect("secret123").unwrap();
        assert_ne!(stored, "secret123");
        assert!(creds.verify("secret123", &stored).unwrap());
        assert!(!creds.verify("wrong", &stored).unwrap());
    }

    #[test]
    fn plain_text_compares_verbatim() {
        let creds = PlainTextCredentials;
        let stored = creds.protect("admin123").unwrap();
        assert!(creds.verify("admin123", &stored).unwrap());
        assert!(!creds.verify("Admin123", &stored).unwrap());
    }
}
