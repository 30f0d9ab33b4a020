// Login authentication: presence/time-of-day risk heuristic and a bounded attempt history

use chrono::{DateTime, Duration, Local, Timelike};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::config::SecuritySettings;
use crate::models::LoginPayload;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::sanitize_for_log;

pub const UNKNOWN_DEVICE: &str = "Unknown device";
pub const UNKNOWN_LOCATION: &str = "Unknown location";

// Risk factor raised by the login heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFactor {
    MissingFaceData,
    MissingTypingPattern,
    UnusualLoginTime,
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            RiskFactor::MissingFaceData => "Missing facial biometric data",
            RiskFactor::MissingTypingPattern => "Missing typing pattern data",
            RiskFactor::UnusualLoginTime => "Unusual login time",
        };
        f.write_str(description)
    }
}

// Risk level with the factors that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: f64,
    pub factors: Vec<RiskFactor>,
}

// One login attempt as recorded in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationRecord {
    pub timestamp: DateTime<Local>,
    pub device: String,
    pub location: String,
    pub risk_level: f64,
    pub success: bool,
}

// Result handed back to the caller of `authenticate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationOutcome {
    pub success: bool,
    pub risk_level: f64,
    pub risk_factors: Vec<RiskFactor>,
    pub timestamp: DateTime<Local>,
    pub additional_verification_required: bool,
}

// Acknowledgment of a step-up verification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub verification_type: String,
    pub timestamp: DateTime<Local>,
    pub expires_in_minutes: i64,
    pub expires_at: DateTime<Local>,
}

/// Authentication system for login attempts.
///
/// Risk comes only from which biometric fields are present and the local hour;
/// the AI verifiers are a separate computation the caller may run alongside.
pub struct AuthenticationSystem {
    settings: SecuritySettings,
    clock: Arc<dyn Clock>,
    history: VecDeque<AuthenticationRecord>,
}

impl AuthenticationSystem {
    pub fn new(settings: SecuritySettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: SecuritySettings, clock: Arc<dyn Clock>) -> Self {
        let history = VecDeque::with_capacity(settings.history_capacity);

        AuthenticationSystem {
            settings,
            clock,
            history,
        }
    }

    /// Authenticate a login attempt and record it
    pub fn authenticate(&mut self, user_data: &LoginPayload) -> AuthenticationOutcome {
        let timestamp = self.clock.now();
        let device = user_data.device_info().unwrap_or(UNKNOWN_DEVICE).to_string();
        let location = user_data.location().unwrap_or(UNKNOWN_LOCATION).to_string();

        info!("Authenticating user at {}", timestamp);
        info!("Device: {}", device);
        info!("Location: {}", location);
        debug!(
            "Payload: {}",
            sanitize_for_log(&serde_json::to_value(user_data).unwrap_or_default())
        );

        let assessment = self.assess_risk_at(user_data, timestamp);
        let success = assessment.level < self.settings.risk_threshold;
        let additional_verification_required = assessment.level
            >= self.settings.additional_verification_floor
            && assessment.level < self.settings.risk_threshold;

        self.record(AuthenticationRecord {
            timestamp,
            device,
            location,
            risk_level: assessment.level,
            success,
        });

        AuthenticationOutcome {
            success,
            risk_level: assessment.level,
            risk_factors: assessment.factors,
            timestamp,
            additional_verification_required,
        }
    }

    /// Risk level in [0, 1] for the given payload at the current hour
    pub fn evaluate_risk(&self, user_data: &LoginPayload) -> f64 {
        self.assess_risk(user_data).level
    }

    /// Risk level together with the factors that contributed to it
    pub fn assess_risk(&self, user_data: &LoginPayload) -> RiskAssessment {
        self.assess_risk_at(user_data, self.clock.now())
    }

    fn assess_risk_at(&self, user_data: &LoginPayload, now: DateTime<Local>) -> RiskAssessment {
        let mut factors = Vec::new();
        let mut level = 0.0;

        if user_data.face_data().is_none() {
            factors.push(RiskFactor::MissingFaceData);
            level += self.settings.missing_face_weight;
        }

        if user_data.typing_pattern().is_none() {
            factors.push(RiskFactor::MissingTypingPattern);
            level += self.settings.missing_typing_weight;
        }

        let hour = now.hour();
        if (self.settings.unusual_hours_start..=self.settings.unusual_hours_end).contains(&hour) {
            factors.push(RiskFactor::UnusualLoginTime);
            level += self.settings.unusual_hour_weight;
        }

        debug!("Risk factors: {:?}", factors);

        RiskAssessment {
            level: f64::min(level, 1.0),
            factors,
        }
    }

    /// Ask the user for a second factor
    pub fn request_additional_verification(&self, verification_type: &str) -> VerificationRequest {
        info!("Requesting additional verification: {}", verification_type);

        let timestamp = self.clock.now();
        let expires_in_minutes = self.settings.verification_expiry_minutes;

        VerificationRequest {
            verification_type: verification_type.to_string(),
            timestamp,
            expires_in_minutes,
            expires_at: timestamp + Duration::minutes(expires_in_minutes),
        }
    }

    /// Recorded attempts, oldest first
    pub fn history(&self) -> impl Iterator<Item = &AuthenticationRecord> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn record(&mut self, record: AuthenticationRecord) {
        if self.settings.history_capacity == 0 {
            return;
        }

        // Evict the oldest attempts once the ring is full
        while self.history.len() >= self.settings.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }
}

impl fmt::Display for AuthenticationSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthenticationSystem(attempts_recorded={})", self.history.len())
    }
}
