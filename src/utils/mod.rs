pub mod clock;
pub mod logging;

use uuid::Uuid;

/// Field names whose values must never reach the logs
const SENSITIVE_FIELDS: [&str; 4] = ["password", "password_hash", "face_data", "typing_pattern"];

/// Generates a unique ID for entities
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4())
}

/// Formats a risk or confidence score for display
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

/// Sanitizes a JSON payload for use in logs (redacts credential and biometric values)
pub fn sanitize_for_log(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let redacted = map
                .iter()
                .map(|(key, value)| {
                    if SENSITIVE_FIELDS.contains(&key.as_str()) {
                        (key.clone(), serde_json::Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), sanitize_for_log(value))
                    }
                })
                .collect();
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(sanitize_for_log).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_id() {
        let id = generate_id("session");
        assert!(id.starts_with("session_"));
        assert_eq!(id.len(), 44); // "session_" + 36 chars for UUID
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.6), "0.60");
        assert_eq!(format_score(0.856), "0.86");
    }

    #[test]
    fn test_sanitize_for_log() {
        let payload = json!({
            "username": "user123",
            "password": "password123",
            "details": { "face_data": "base64_encoded_face_image", "location": "48.8566,2.3522" },
        });

        let sanitized = sanitize_for_log(&payload);

        assert_eq!(sanitized["username"], "user123");
        assert_eq!(sanitized["password"], "[REDACTED]");
        assert_eq!(sanitized["details"]["face_data"], "[REDACTED]");
        assert_eq!(sanitized["details"]["location"], "48.8566,2.3522");
    }
}
