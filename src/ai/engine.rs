use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::scoring::{RandomScores, ScoreSource};
use crate::config::{AiSettings, RiskWeights};

// Sampling ranges and pass thresholds for each verifier
const FACE_RANGE: (f64, f64) = (0.7, 0.99);
const FACE_PASS: f64 = 0.8;
const TYPING_RANGE: (f64, f64) = (0.6, 0.95);
const TYPING_PASS: f64 = 0.75;
const LOCATION_RANGE: (f64, f64) = (0.1, 0.6);
const LOCATION_MAX_RISK: f64 = 0.4;
const TRUSTED_DEVICE_RISK: f64 = 0.1;
const UNKNOWN_DEVICE_RANGE: (f64, f64) = (0.2, 0.8);
const DEVICE_MAX_RISK: f64 = 0.5;

/// The four independent verification factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationFactor {
    Face,
    Typing,
    Location,
    Device,
}

impl VerificationFactor {
    pub const ALL: [VerificationFactor; 4] = [
        VerificationFactor::Face,
        VerificationFactor::Typing,
        VerificationFactor::Location,
        VerificationFactor::Device,
    ];

    /// Face and typing report confidence; location and device already report risk
    pub fn reports_confidence(self) -> bool {
        matches!(self, VerificationFactor::Face | VerificationFactor::Typing)
    }

    fn weight(self, weights: &RiskWeights) -> f64 {
        match self {
            VerificationFactor::Face => weights.face,
            VerificationFactor::Typing => weights.typing,
            VerificationFactor::Location => weights.location,
            VerificationFactor::Device => weights.device,
        }
    }
}

/// Outcome of one verifier call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub success: bool,
    /// Confidence for face/typing, risk for location/device
    pub score: f64,
}

impl VerificationResult {
    pub fn new(success: bool, score: f64) -> Self {
        VerificationResult { success, score }
    }
}

/// Verification counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationStats {
    pub total_attempts: u64,
    pub successful_verifications: u64,
    pub flagged_attempts: u64,
    pub success_rate: f64,
}

/// Stand-in "AI" verifiers plus the weighted risk aggregation
pub struct AIEngine {
    face_model: String,
    typing_model: String,
    location_model: String,
    weights: RiskWeights,
    scores: Box<dyn ScoreSource>,
    verification_attempts: u64,
    successful_verifications: u64,
    flagged_attempts: u64,
}

impl AIEngine {
    pub fn new(settings: &AiSettings) -> Self {
        Self::with_score_source(settings, Box::new(RandomScores::new()))
    }

    pub fn with_score_source(settings: &AiSettings, scores: Box<dyn ScoreSource>) -> Self {
        AIEngine {
            face_model: settings.face_model.clone(),
            typing_model: settings.typing_model.clone(),
            location_model: settings.location_model.clone(),
            weights: settings.weights,
            scores,
            verification_attempts: 0,
            successful_verifications: 0,
            flagged_attempts: 0,
        }
    }

    /// Compare captured face data against the enrolled template
    pub fn verify_face(&mut self, face_data: &str, stored_face: &str) -> VerificationResult {
        info!("Verifying facial data using {}", self.face_model);
        debug!("Face sample {} bytes, template {} bytes", face_data.len(), stored_face.len());

        let confidence = self.scores.uniform(FACE_RANGE.0, FACE_RANGE.1);
        self.record(confidence >= FACE_PASS, confidence)
    }

    /// Compare keystroke dynamics against the enrolled pattern
    pub fn analyze_typing(&mut self, typing_pattern: &str, stored_pattern: &str) -> VerificationResult {
        info!("Analyzing typing pattern using {}", self.typing_model);
        debug!(
            "Typing sample {} bytes, template {} bytes",
            typing_pattern.len(),
            stored_pattern.len()
        );

        let confidence = self.scores.uniform(TYPING_RANGE.0, TYPING_RANGE.1);
        self.record(confidence >= TYPING_PASS, confidence)
    }

    /// Score how unusual the location is. Returns risk, not confidence.
    pub fn verify_location(&mut self, location: &str, historical_locations: &[String]) -> VerificationResult {
        info!("Verifying location using {}", self.location_model);
        debug!("Location {} against {} historical entries", location, historical_locations.len());

        let risk = self.scores.uniform(LOCATION_RANGE.0, LOCATION_RANGE.1);
        self.record(risk < LOCATION_MAX_RISK, risk)
    }

    /// Score the device. A device whose description appears within a trusted entry gets a fixed low risk.
    pub fn verify_device(&mut self, device_info: &str, trusted_devices: &[String]) -> VerificationResult {
        info!("Verifying device");

        let is_trusted = trusted_devices
            .iter()
            .any(|trusted| trusted.contains(device_info));

        let risk = if is_trusted {
            TRUSTED_DEVICE_RISK
        } else {
            self.scores.uniform(UNKNOWN_DEVICE_RANGE.0, UNKNOWN_DEVICE_RANGE.1)
        };

        self.record(risk < DEVICE_MAX_RISK, risk)
    }

    /// Weighted average risk over the supplied factors. Confidence scores are
    /// inverted before weighting. No factors means no evidence of risk: 0.0.
    pub fn predict_risk_level(&self, results: &HashMap<VerificationFactor, VerificationResult>) -> f64 {
        let mut total_risk = 0.0;
        let mut total_weight = 0.0;

        // Fixed factor order keeps the sum independent of map iteration order
        for factor in VerificationFactor::ALL {
            if let Some(result) = results.get(&factor) {
                let risk = if factor.reports_confidence() {
                    1.0 - result.score
                } else {
                    result.score
                };
                let weight = factor.weight(&self.weights);

                total_risk += risk * weight;
                total_weight += weight;
            }
        }

        if total_weight == 0.0 {
            return 0.0;
        }

        total_risk / total_weight
    }

    pub fn get_verification_stats(&self) -> VerificationStats {
        let success_rate = if self.verification_attempts > 0 {
            self.successful_verifications as f64 / self.verification_attempts as f64
        } else {
            0.0
        };

        VerificationStats {
            total_attempts: self.verification_attempts,
            successful_verifications: self.successful_verifications,
            flagged_attempts: self.flagged_attempts,
            success_rate,
        }
    }

    fn record(&mut self, success: bool, score: f64) -> VerificationResult {
        self.verification_attempts += 1;
        if success {
            self.successful_verifications += 1;
        } else {
            self.flagged_attempts += 1;
        }

        VerificationResult::new(success, score)
    }
}

impl fmt::Display for AIEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AIEngine(face_model={}, type_model={}, location_model={})",
            self.face_model, self.typing_model, self.location_model
        )
    }
}
