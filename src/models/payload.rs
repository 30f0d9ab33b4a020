use serde::{Deserialize, Serialize};

/// Credential, biometric and context fields submitted with a login attempt.
/// Every field is optional; an empty string counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl LoginPayload {
    pub fn face_data(&self) -> Option<&str> {
        non_empty(&self.face_data)
    }

    pub fn typing_pattern(&self) -> Option<&str> {
        non_empty(&self.typing_pattern)
    }

    pub fn device_info(&self) -> Option<&str> {
        non_empty(&self.device_info)
    }

    pub fn location(&self) -> Option<&str> {
        non_empty(&self.location)
    }

    pub fn ip_address(&self) -> Option<&str> {
        non_empty(&self.ip_address)
    }

    /// Names of the fields that carry a value, in declaration order
    pub fn present_keys(&self) -> Vec<&'static str> {
        [
            ("username", &self.username),
            ("password", &self.password),
            ("face_data", &self.face_data),
            ("typing_pattern", &self.typing_pattern),
            ("ip_address", &self.ip_address),
            ("device_info", &self.device_info),
            ("location", &self.location),
        ]
        .into_iter()
        .filter(|(_, value)| non_empty(value).is_some())
        .map(|(key, _)| key)
        .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
