use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Produces the samples verifiers score against.
/// The engine never touches an RNG directly so tests can script outcomes.
pub trait ScoreSource: Send {
    /// Sample from [low, high]
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Sample an integer from [low, high]
    fn uniform_count(&mut self, low: u32, high: u32) -> u32;

    /// Sample from [0, 1]
    fn chance(&mut self) -> f64 {
        self.uniform(0.0, 1.0)
    }
}

/// Uniform random sampling
pub struct RandomScores {
    rng: StdRng,
}

impl RandomScores {
    pub fn new() -> Self {
        RandomScores {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        RandomScores {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomScores {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreSource for RandomScores {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn uniform_count(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Scripted samples, returned in order regardless of the requested range.
/// Once exhausted, every request yields the lower bound.
#[derive(Debug, Default, Clone)]
pub struct FixedScores {
    values: VecDeque<f64>,
}

impl FixedScores {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        FixedScores {
            values: values.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl ScoreSource for FixedScores {
    fn uniform(&mut self, low: f64, _high: f64) -> f64 {
        self.values.pop_front().unwrap_or(low)
    }

    fn uniform_count(&mut self, low: u32, _high: u32) -> u32 {
        self.values
            .pop_front()
            .map(|v| v.max(0.0).round() as u32)
            .unwrap_or(low)
    }
}
