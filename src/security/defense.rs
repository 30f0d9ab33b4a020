// Proactive defense: rule-based threat detection, IP blocking and security alerts

use chrono::{DateTime, Local};
use log::{info, warn};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::ai::scoring::{RandomScores, ScoreSource};
use crate::config::DefenseSettings;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::generate_id;

/// Current threat level; ordering follows severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatLevel {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl ThreatLevel {
    pub fn response_plan(self) -> &'static str {
        match self {
            ThreatLevel::Low => "Standard monitoring",
            ThreatLevel::Medium => "Enhanced monitoring, notify security team",
            ThreatLevel::High => {
                "Block suspicious activity, require additional authentication, alert security team"
            }
            ThreatLevel::Critical => {
                "Lockdown affected systems, block all suspicious IPs, immediate security team response"
            }
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    BruteForceAttempt,
    UnusualTransaction,
    BlockedIpAccess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatDetails {
    pub kind: ThreatKind,
    pub severity: ThreatLevel,
    pub evidence: String,
}

/// Observed activity handed to `detect_threat`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityData {
    pub username: Option<String>,
    pub login_attempts: Option<u32>,
    pub transaction_amount: Option<Decimal>,
    pub ip_address: Option<String>,
    pub risk_level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub threat_detected: bool,
    pub threat_level: ThreatLevel,
    pub details: Option<ThreatDetails>,
    pub response_plan: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveThreat {
    pub timestamp: DateTime<Local>,
    pub details: ThreatDetails,
    pub activity: ActivityData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertAction {
    ThreatDetected,
    BlockAccess,
    SecurityTeamAlert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    New,
    Pending,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl From<ThreatLevel> for AlertPriority {
    fn from(level: ThreatLevel) -> Self {
        match level {
            ThreatLevel::Low => AlertPriority::Low,
            ThreatLevel::Medium => AlertPriority::Medium,
            ThreatLevel::High => AlertPriority::High,
            ThreatLevel::Critical => AlertPriority::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityAlert {
    pub id: String,
    pub timestamp: DateTime<Local>,
    pub action: AlertAction,
    pub threat_level: ThreatLevel,
    pub priority: AlertPriority,
    pub message: String,
    pub status: AlertStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_time: DateTime<Local>,
    pub vulnerabilities_found: u32,
    pub suspicious_patterns: u32,
    pub threat_level: ThreatLevel,
    pub response_plan: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityStatus {
    pub threat_level: ThreatLevel,
    pub response_plan: String,
    pub active_threats: usize,
    pub blocked_ips: usize,
    pub security_alerts: usize,
    pub last_scan_time: DateTime<Local>,
}

/// Proactive defense system.
///
/// Threats and alerts are kept in rings bounded by `alert_capacity`.
pub struct ProactiveDefenseSystem {
    settings: DefenseSettings,
    scores: Box<dyn ScoreSource>,
    clock: Arc<dyn Clock>,
    threat_level: ThreatLevel,
    active_threats: VecDeque<ActiveThreat>,
    blocked_ips: HashSet<String>,
    security_alerts: VecDeque<SecurityAlert>,
    last_scan_time: DateTime<Local>,
}

impl ProactiveDefenseSystem {
    pub fn new(settings: DefenseSettings) -> Self {
        Self::with_sources(settings, Box::new(RandomScores::new()), Arc::new(SystemClock))
    }

    pub fn with_sources(settings: DefenseSettings, scores: Box<dyn ScoreSource>, clock: Arc<dyn Clock>) -> Self {
        let last_scan_time = clock.now();

        ProactiveDefenseSystem {
            settings,
            scores,
            clock,
            threat_level: ThreatLevel::Low,
            active_threats: VecDeque::new(),
            blocked_ips: HashSet::new(),
            security_alerts: VecDeque::new(),
            last_scan_time,
        }
    }

    pub fn threat_level(&self) -> ThreatLevel {
        self.threat_level
    }

    pub fn response_plan(&self) -> &'static str {
        self.threat_level.response_plan()
    }

    /// Run the detection rules in order. When several match, the last one reported wins.
    pub fn detect_threat(&mut self, activity: &ActivityData) -> ThreatAssessment {
        info!("Analyzing activity for potential threats");

        let mut detected: Option<ThreatDetails> = None;

        if let Some(attempts) = activity.login_attempts {
            if attempts > self.settings.brute_force_attempts {
                detected = Some(ThreatDetails {
                    kind: ThreatKind::BruteForceAttempt,
                    severity: ThreatLevel::High,
                    evidence: format!("{} login attempts in quick succession", attempts),
                });
            }
        }

        if let Some(amount) = activity.transaction_amount {
            let is_large = amount
                .to_f64()
                .map_or(false, |a| a > self.settings.large_transaction_amount);

            // Large transfers are only sometimes suspicious
            if is_large && self.scores.chance() < self.settings.large_transaction_flag_probability {
                detected = Some(ThreatDetails {
                    kind: ThreatKind::UnusualTransaction,
                    severity: ThreatLevel::Medium,
                    evidence: format!("Unusually large transaction: ${}", amount),
                });
            }
        }

        if let Some(ip) = activity.ip_address.as_deref() {
            if self.blocked_ips.contains(ip) {
                detected = Some(ThreatDetails {
                    kind: ThreatKind::BlockedIpAccess,
                    severity: ThreatLevel::Critical,
                    evidence: format!("Access attempt from blocked IP: {}", ip),
                });
            }
        }

        if let Some(details) = &detected {
            warn!("Threat detected: {:?} ({})", details.kind, details.evidence);
            self.threat_level = details.severity;

            let now = self.clock.now();
            self.push_threat(ActiveThreat {
                timestamp: now,
                details: details.clone(),
                activity: activity.clone(),
            });
            self.push_alert(SecurityAlert {
                id: generate_id("alert"),
                timestamp: now,
                action: AlertAction::ThreatDetected,
                threat_level: self.threat_level,
                priority: self.threat_level.into(),
                message: details.evidence.clone(),
                status: AlertStatus::New,
            });
        }

        ThreatAssessment {
            threat_detected: detected.is_some(),
            threat_level: self.threat_level,
            details: detected,
            response_plan: self.response_plan().to_string(),
        }
    }

    /// Block an IP address. Blocking an already blocked address is a no-op for the list.
    pub fn block_access(&mut self, ip_address: &str, reason: &str) -> bool {
        info!("Blocking access from {}: {}", ip_address, reason);

        if self.blocked_ips.insert(ip_address.to_string()) {
            info!("IP address {} added to blocked list", ip_address);
        }

        self.push_alert(SecurityAlert {
            id: generate_id("alert"),
            timestamp: self.clock.now(),
            action: AlertAction::BlockAccess,
            threat_level: self.threat_level,
            priority: self.threat_level.into(),
            message: format!("Blocked {}: {}", ip_address, reason),
            status: AlertStatus::Resolved,
        });

        true
    }

    pub fn is_blocked(&self, ip_address: &str) -> bool {
        self.blocked_ips.contains(ip_address)
    }

    /// Notify the security team. Priority defaults to the current threat level.
    pub fn alert_security_team(&mut self, message: &str, priority: Option<AlertPriority>) -> bool {
        info!("Alerting security team: {}", message);

        let priority = priority.unwrap_or_else(|| self.threat_level.into());

        self.push_alert(SecurityAlert {
            id: generate_id("alert"),
            timestamp: self.clock.now(),
            action: AlertAction::SecurityTeamAlert,
            threat_level: self.threat_level,
            priority,
            message: message.to_string(),
            status: AlertStatus::Pending,
        });

        true
    }

    pub fn run_security_scan(&mut self) -> ScanReport {
        info!("Running comprehensive security scan");
        self.last_scan_time = self.clock.now();

        let vulnerabilities_found = self.scores.uniform_count(0, 3);
        let suspicious_patterns = self.scores.uniform_count(0, 2);

        if vulnerabilities_found > 2 || suspicious_patterns > 1 {
            self.threat_level = ThreatLevel::High;
        }

        ScanReport {
            scan_time: self.last_scan_time,
            vulnerabilities_found,
            suspicious_patterns,
            threat_level: self.threat_level,
            response_plan: self.response_plan().to_string(),
        }
    }

    pub fn get_security_status(&self) -> SecurityStatus {
        SecurityStatus {
            threat_level: self.threat_level,
            response_plan: self.response_plan().to_string(),
            active_threats: self.active_threats.len(),
            blocked_ips: self.blocked_ips.len(),
            security_alerts: self.security_alerts.len(),
            last_scan_time: self.last_scan_time,
        }
    }

    /// Alerts, oldest first
    pub fn alerts(&self) -> impl Iterator<Item = &SecurityAlert> {
        self.security_alerts.iter()
    }

    fn push_threat(&mut self, threat: ActiveThreat) {
        push_bounded(&mut self.active_threats, threat, self.settings.alert_capacity);
    }

    fn push_alert(&mut self, alert: SecurityAlert) {
        push_bounded(&mut self.security_alerts, alert, self.settings.alert_capacity);
    }
}

// Ring insert; capacity 0 keeps nothing
fn push_bounded<T>(ring: &mut VecDeque<T>, item: T, capacity: usize) {
    if capacity == 0 {
        return;
    }

    while ring.len() >= capacity {
        ring.pop_front();
    }
    ring.push_back(item);
}

impl fmt::Display for ProactiveDefenseSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProactiveDefenseSystem(threat_level={}, active_threats={})",
            self.threat_level,
            self.active_threats.len()
        )
    }
}
