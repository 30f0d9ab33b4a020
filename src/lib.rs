// Re-export modules
pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod interfaces;
pub mod models;
pub mod security;
pub mod utils;

pub use error::{BankError, Result};
