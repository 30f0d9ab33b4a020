// src/security/mod.rs
pub mod authentication;
pub mod credentials;
pub mod defense;
pub mod password;

pub use authentication::{AuthenticationOutcome, AuthenticationSystem, RiskAssessment, RiskFactor};
pub use defense::{ActivityData, ProactiveDefenseSystem, ThreatLevel};
pub use password::{PasswordError, PasswordPolicy, PasswordService};
