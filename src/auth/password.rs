use crate::error::AppError;
use bcrypt::{hash, verify};

/// One-way password hashing and comparison.
pub trait CredentialVerifier: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String, AppError>;
    fn verify_password(&self, password: &str, hashed_password: &str) -> Result<bool, AppError>;
}

/// bcrypt-backed `CredentialVerifier`.
#[derive(Debug, Clone, Copy)]
pub struct BcryptVerifier {
    cost: u32,
}

impl BcryptVerifier {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptVerifier {
    fn default() -> Self {
        Self::new(12)
    }
}

impl CredentialVerifier for BcryptVerifier {
    fn hash_password(&self, password: &str) -> Result<String, AppError> {
        Ok(hash(password, self.cost)?)
    }

    fn verify_password(&self, password: &str, hashed_password: &str) -> Result<bool, AppError> {
        Ok(verify(password, hashed_password)?)
    }
}
