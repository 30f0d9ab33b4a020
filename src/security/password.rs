// src/security/password.rs - Password policy, hashing and verification
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::error;
use thiserror::Error;

/// Password service error
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),

    #[error("Failed to verify password: {0}")]
    VerificationError(String),

    #[error("Password does not meet policy: {0}")]
    PolicyViolation(String),
}

/// Complexity rules enforced before a password is hashed
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_number: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        PasswordPolicy {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_number: true,
            require_special: true,
        }
    }
}

impl PasswordPolicy {
    /// Check a candidate password, naming the first rule it breaks
    pub fn check(&self, password: &str) -> Result<(), PasswordError> {
        let violation = if password.chars().count() < self.min_length {
            Some(format!("must be at least {} characters", self.min_length))
        } else if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            Some("must contain an uppercase letter".to_string())
        } else if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            Some("must contain a lowercase letter".to_string())
        } else if self.require_number && !password.chars().any(|c| c.is_ascii_digit()) {
            Some("must contain a number".to_string())
        } else if self.require_special && password.chars().all(|c| c.is_alphanumeric()) {
            Some("must contain a special character".to_string())
        } else {
            None
        };

        match violation {
            Some(reason) => Err(PasswordError::PolicyViolation(reason)),
            None => Ok(()),
        }
    }
}

/// Argon2 password hashing for stored customer credentials
#[derive(Default)]
pub struct PasswordService {
    policy: PasswordPolicy,
}

impl PasswordService {
    pub fn new(policy: PasswordPolicy) -> Self {
        PasswordService { policy }
    }

    /// Enforce the policy, then hash into a PHC string
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.policy.check(password)?;

        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Password hashing error: {}", e);
                PasswordError::HashingError(e.to_string())
            })
    }

    /// Verify a password against a stored PHC string
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            error!("Password hash parsing error: {}", e);
            PasswordError::VerificationError(e.to_string())
        })?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
