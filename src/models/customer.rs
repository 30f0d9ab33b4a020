use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::LoginPayload;

pub type CustomerId = u64;

/// A bank customer with the credentials and biometric templates captured at enrollment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub face_data: Option<String>,
    pub typing_pattern: Option<String>,
}

impl Customer {
    pub fn new(customer_id: CustomerId, username: &str, password: &str) -> Self {
        Customer {
            customer_id,
            username: username.to_string(),
            password: password.to_string(),
            face_data: None,
            typing_pattern: None,
        }
    }

    pub fn with_biometrics(mut self, face_data: &str, typing_pattern: &str) -> Self {
        self.face_data = Some(face_data.to_string());
        self.typing_pattern = Some(typing_pattern.to_string());
        self
    }

    /// Start a login. Always succeeds; the real decision belongs to the authentication system.
    pub fn login(&self) -> bool {
        info!("Customer {} attempting to login", self.username);
        true
    }

    /// Ask for access to a resource. No authorization check is performed.
    pub fn request_access(&self, resource: &str) -> bool {
        info!("Customer {} requesting access to {}", self.username, resource);
        true
    }

    /// Overlay this customer's credentials and biometrics onto a collected payload
    pub fn fill_payload(&self, payload: &mut LoginPayload) {
        payload.username = Some(self.username.clone());
        payload.password = Some(self.password.clone());
        payload.face_data = self.face_data.clone();
        payload.typing_pattern = self.typing_pattern.clone();
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Customer(id={}, username={})", self.customer_id, self.username)
    }
}
