pub mod engine;
pub mod scoring;

pub use engine::{AIEngine, VerificationFactor, VerificationResult, VerificationStats};
pub use scoring::{FixedScores, RandomScores, ScoreSource};
