// Login front end: collects a simulated credential and biometric payload

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::LoginPayload;

pub const SESSION_ACTIVE: &str = "active";
const LAST_ACTIVITY: &str = "2025-05-16T16:28:00Z";
const AUTHENTICATION_LEVEL: &str = "multi-factor";

// Snapshot returned by `get_session_status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: u64,
    pub status: String,
    pub last_activity: String,
    pub authentication_level: String,
}

/// Login interface bound to one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginInterface {
    session_id: u64,
}

impl LoginInterface {
    pub fn new(session_id: u64) -> Self {
        LoginInterface { session_id }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Simulated capture. Every field is filled with fixed demo values.
    pub fn collect_input(&self) -> LoginPayload {
        info!("Collecting user input for session {}", self.session_id);

        LoginPayload {
            username: Some("user123".to_string()),
            password: Some("password123".to_string()),
            face_data: Some("base64_encoded_face_image".to_string()),
            typing_pattern: Some("keystroke_timing_data".to_string()),
            ip_address: Some("192.168.1.1".to_string()),
            device_info: Some("Windows 11, Chrome 98.0.4758.102".to_string()),
            location: Some("48.8566,2.3522".to_string()),
        }
    }

    /// Hand the payload over. Only field names are logged, never values.
    pub fn send_to_authentication(&self, auth_data: &LoginPayload) -> bool {
        info!(
            "Sending authentication data for session {} to authentication system",
            self.session_id
        );
        info!("Data includes: {}", auth_data.present_keys().join(", "));

        true
    }

    pub fn get_session_status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.session_id,
            status: SESSION_ACTIVE.to_string(),
            last_activity: LAST_ACTIVITY.to_string(),
            authentication_level: AUTHENTICATION_LEVEL.to_string(),
        }
    }
}

impl fmt::Display for LoginInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoginInterface(session_id={})", self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_input_is_complete() {
        let interface = LoginInterface::new(42);

        let payload = interface.collect_input();

        assert_eq!(payload.username.as_deref(), Some("user123"));
        assert_eq!(payload.device_info(), Some("Windows 11, Chrome 98.0.4758.102"));
        assert_eq!(payload.location(), Some("48.8566,2.3522"));
        assert_eq!(payload.present_keys().len(), 7);
    }

    #[test]
    fn test_send_always_succeeds() {
        let interface = LoginInterface::new(42);

        assert!(interface.send_to_authentication(&LoginPayload::default()));
        assert!(interface.send_to_authentication(&interface.collect_input()));
    }

    #[test]
    fn test_session_status() {
        let status = LoginInterface::new(7).get_session_status();

        assert_eq!(status.session_id, 7);
        assert_eq!(status.status, "active");
        assert_eq!(status.last_activity, "2025-05-16T16:28:00Z");
        assert_eq!(status.authentication_level, "multi-factor");
    }

    #[test]
    fn test_display() {
        assert_eq!(LoginInterface::new(9).to_string(), "LoginInterface(session_id=9)");
    }
}
