use thiserror::Error;

use crate::security::password::PasswordError;

/// Errors raised at the fallible edges of the platform: storage and encoding.
/// The login pipeline itself never fails: missing data is scored, not rejected.
#[derive(Error, Debug)]
pub enum BankError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("User {0} not found")]
    UserNotFound(u64),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

pub type Result<T> = std::result::Result<T, BankError>;
