// src/db/user_store.rs - Customer directory with optional JSON file persistence
use chrono::{DateTime, Local, Timelike};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BankError, Result};
use crate::models::{CustomerId, LoginPayload};

// Account fields supplied at enrollment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub balance: Decimal,
    pub face_data: Option<String>,
    pub typing_pattern: Option<String>,
}

// Partial update; `None` fields are left as they are
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub balance: Option<Decimal>,
    pub face_data: Option<String>,
    pub typing_pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRecord {
    pub timestamp: DateTime<Local>,
    pub device_info: Option<String>,
    pub location: Option<String>,
    pub ip_address: Option<String>,
    pub success: bool,
    pub risk_level: Option<f64>,
}

impl LoginRecord {
    /// Record a login attempt from the fields of a payload
    pub fn from_payload(payload: &LoginPayload, timestamp: DateTime<Local>, success: bool) -> Self {
        LoginRecord {
            timestamp,
            device_info: payload.device_info().map(str::to_string),
            location: payload.location().map(str::to_string),
            ip_address: payload.ip_address().map(str::to_string),
            success,
            risk_level: None,
        }
    }

    pub fn with_risk_level(mut self, risk_level: f64) -> Self {
        self.risk_level = Some(risk_level);
        self
    }
}

/// Everything known about one customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetail {
    pub user_id: CustomerId,
    pub profile: UserProfile,
    pub stored_face: Option<String>,
    pub stored_typing_pattern: Option<String>,
    pub trusted_devices: Vec<String>,
    pub historical_logins: Vec<LoginRecord>,
}

impl UserDetail {
    /// Locations of past logins that recorded one
    pub fn historical_locations(&self) -> Vec<String> {
        self.historical_logins
            .iter()
            .filter_map(|login| login.location.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anomaly {
    UntrustedDevice,
    UnusualLocation,
    UnusualLoginTime,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            Anomaly::UntrustedDevice => "Untrusted device",
            Anomaly::UnusualLocation => "Unusual location",
            Anomaly::UnusualLoginTime => "Unusual login time",
        };
        f.write_str(description)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginComparison {
    pub user_id: CustomerId,
    pub anomalies: Vec<Anomaly>,
    pub anomaly_count: usize,
    pub is_suspicious: bool,
}

// On-disk layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserData {
    #[serde(default)]
    users: BTreeMap<CustomerId, UserProfile>,
    #[serde(default)]
    stored_face: BTreeMap<CustomerId, String>,
    #[serde(default)]
    stored_typing_pattern: BTreeMap<CustomerId, String>,
    #[serde(default)]
    trusted_devices: BTreeMap<CustomerId, Vec<String>>,
    #[serde(default)]
    historical_logins: BTreeMap<CustomerId, Vec<LoginRecord>>,
}

pub const DEFAULT_LOGIN_HISTORY_CAPACITY: usize = 100;

/// Customer directory keyed by customer id.
///
/// When opened on a file, every mutation is written back immediately. A mutation
/// whose write fails leaves the in-memory state untouched.
pub struct UserStore {
    path: Option<PathBuf>,
    data: UserData,
    login_history_capacity: usize,
}

impl UserStore {
    pub fn in_memory() -> Self {
        UserStore {
            path: None,
            data: UserData::default(),
            login_history_capacity: DEFAULT_LOGIN_HISTORY_CAPACITY,
        }
    }

    /// Open a store backed by `path`. A missing file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let data: UserData = serde_json::from_str(&contents)?;
            info!("Loaded user data from {}", path.display());
            data
        } else {
            info!("Data file {} does not exist, starting with empty store", path.display());
            UserData::default()
        };

        Ok(UserStore {
            path: Some(path),
            data,
            login_history_capacity: DEFAULT_LOGIN_HISTORY_CAPACITY,
        })
    }

    /// Keep at most `capacity` login records per customer, dropping the oldest
    pub fn with_login_history_capacity(mut self, capacity: usize) -> Self {
        self.login_history_capacity = capacity;
        self
    }

    pub fn len(&self) -> usize {
        self.data.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.users.is_empty()
    }

    pub fn contains(&self, user_id: CustomerId) -> bool {
        self.data.users.contains_key(&user_id)
    }

    /// Add a new customer. Returns false if the id is taken.
    pub fn add_user(&mut self, user_id: CustomerId, profile: UserProfile) -> Result<bool> {
        if self.contains(user_id) {
            warn!("User {} already exists", user_id);
            return Ok(false);
        }

        let mut staged = self.data.clone();

        if let Some(face) = &profile.face_data {
            staged.stored_face.insert(user_id, face.clone());
        }
        if let Some(pattern) = &profile.typing_pattern {
            staged.stored_typing_pattern.insert(user_id, pattern.clone());
        }

        staged.users.insert(user_id, profile);
        staged.trusted_devices.insert(user_id, Vec::new());
        staged.historical_logins.insert(user_id, Vec::new());

        self.commit(staged)?;
        Ok(true)
    }

    pub fn get_user_detail(&self, user_id: CustomerId) -> Option<UserDetail> {
        let profile = self.data.users.get(&user_id)?;

        Some(UserDetail {
            user_id,
            profile: profile.clone(),
            stored_face: self.data.stored_face.get(&user_id).cloned(),
            stored_typing_pattern: self.data.stored_typing_pattern.get(&user_id).cloned(),
            trusted_devices: self.data.trusted_devices.get(&user_id).cloned().unwrap_or_default(),
            historical_logins: self.data.historical_logins.get(&user_id).cloned().unwrap_or_default(),
        })
    }

    /// Merge the provided fields. New biometrics also replace the stored templates.
    pub fn update_user(&mut self, user_id: CustomerId, update: ProfileUpdate) -> Result<bool> {
        let mut staged = self.data.clone();
        let profile = match staged.users.get_mut(&user_id) {
            Some(profile) => profile,
            None => {
                warn!("User {} not found", user_id);
                return Ok(false);
            }
        };

        if let Some(username) = update.username {
            profile.username = username;
        }
        if let Some(hash) = update.password_hash {
            profile.password_hash = Some(hash);
        }
        if let Some(email) = update.email {
            profile.email = Some(email);
        }
        if let Some(phone) = update.phone {
            profile.phone = Some(phone);
        }
        if let Some(balance) = update.balance {
            profile.balance = balance;
        }
        if let Some(face) = update.face_data {
            profile.face_data = Some(face.clone());
            staged.stored_face.insert(user_id, face);
        }
        if let Some(pattern) = update.typing_pattern {
            profile.typing_pattern = Some(pattern.clone());
            staged.stored_typing_pattern.insert(user_id, pattern);
        }

        self.commit(staged)?;
        Ok(true)
    }

    pub fn add_login_record(&mut self, user_id: CustomerId, record: LoginRecord) -> Result<bool> {
        if !self.contains(user_id) {
            warn!("User {} not found", user_id);
            return Ok(false);
        }

        let mut staged = self.data.clone();
        let logins = staged.historical_logins.entry(user_id).or_default();
        logins.push(record);
        if logins.len() > self.login_history_capacity {
            let excess = logins.len() - self.login_history_capacity;
            logins.drain(..excess);
        }

        self.commit(staged)?;
        Ok(true)
    }

    /// Trust a device. Already trusted devices are not duplicated.
    pub fn add_trusted_device(&mut self, user_id: CustomerId, device_info: &str) -> Result<bool> {
        if !self.contains(user_id) {
            warn!("User {} not found", user_id);
            return Ok(false);
        }

        let trusted = self.data.trusted_devices.get(&user_id);
        if trusted.map_or(false, |devices| devices.iter().any(|d| d == device_info)) {
            return Ok(true);
        }

        let mut staged = self.data.clone();
        staged
            .trusted_devices
            .entry(user_id)
            .or_default()
            .push(device_info.to_string());

        self.commit(staged)?;

        Ok(true)
    }

    /// Compare a login attempt with the customer's past behaviour
    pub fn compare_with_current(
        &self,
        user_id: CustomerId,
        current: &LoginPayload,
        now: DateTime<Local>,
    ) -> Result<LoginComparison> {
        if !self.contains(user_id) {
            return Err(BankError::UserNotFound(user_id));
        }

        let trusted = self.data.trusted_devices.get(&user_id).map(Vec::as_slice).unwrap_or(&[]);
        let logins = self.data.historical_logins.get(&user_id).map(Vec::as_slice).unwrap_or(&[]);
        let mut anomalies = Vec::new();

        if let Some(device) = current.device_info() {
            if !trusted.iter().any(|t| t.contains(device)) {
                anomalies.push(Anomaly::UntrustedDevice);
            }
        }

        if let Some(location) = current.location() {
            let seen = logins.iter().any(|l| l.location.as_deref() == Some(location));
            if !seen && !logins.is_empty() {
                anomalies.push(Anomaly::UnusualLocation);
            }
        }

        // An hour seen only once before is unusual; a never-seen hour is not flagged
        let mut hour_counts: HashMap<u32, usize> = HashMap::new();
        for login in logins {
            *hour_counts.entry(login.timestamp.hour()).or_insert(0) += 1;
        }
        if let Some(&count) = hour_counts.get(&now.hour()) {
            if count < 2 {
                anomalies.push(Anomaly::UnusualLoginTime);
            }
        }

        debug!("Anomalies for user {}: {:?}", user_id, anomalies);

        Ok(LoginComparison {
            user_id,
            anomaly_count: anomalies.len(),
            is_suspicious: anomalies.len() > 1,
            anomalies,
        })
    }

    /// Persist `staged`, then make it the live state
    fn commit(&mut self, staged: UserData) -> Result<()> {
        self.write(&staged)?;
        self.data = staged;
        Ok(())
    }

    fn write(&self, data: &UserData) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, serde_json::to_string_pretty(data)?)?;
        debug!("Saved user data to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for UserStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserStore(users={})", self.data.users.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::{Clock, FixedClock};
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    const TRUSTED_DEVICE: &str = "Windows 11, Chrome 98.0.4758.102";
    const DAMASCUS: &str = "33.5102,36.29128";

    fn angel() -> UserProfile {
        UserProfile {
            username: "angel_abubakar".to_string(),
            email: Some("angel_abubakar@gmail.com".to_string()),
            phone: Some("+963123456789".to_string()),
            balance: dec!(5000),
            face_data: Some("base64_encoded_face_data_for_angel".to_string()),
            typing_pattern: Some("angel_typing_pattern_data".to_string()),
            ..Default::default()
        }
    }

    fn login_at(timestamp: DateTime<Local>) -> LoginRecord {
        LoginRecord {
            timestamp,
            device_info: Some(TRUSTED_DEVICE.to_string()),
            location: Some(DAMASCUS.to_string()),
            ip_address: Some("192.168.1.1".to_string()),
            success: true,
            risk_level: None,
        }
    }

    fn seeded_store(now: DateTime<Local>) -> UserStore {
        let mut store = UserStore::in_memory();
        store.add_user(1001, angel()).unwrap();
        store.add_trusted_device(1001, TRUSTED_DEVICE).unwrap();
        for _ in 0..3 {
            store.add_login_record(1001, login_at(now)).unwrap();
        }
        store
    }

    #[test]
    fn test_add_and_get_user() {
        let mut store = UserStore::in_memory();

        assert!(store.add_user(1001, angel()).unwrap());
        assert!(!store.add_user(1001, angel()).unwrap());

        let detail = store.get_user_detail(1001).unwrap();
        assert_eq!(detail.profile.username, "angel_abubakar");
        assert_eq!(detail.stored_face.as_deref(), Some("base64_encoded_face_data_for_angel"));
        assert!(detail.trusted_devices.is_empty());
        assert!(store.get_user_detail(9999).is_none());
    }

    #[test]
    fn test_update_user_refreshes_templates() {
        let mut store = UserStore::in_memory();
        store.add_user(1001, angel()).unwrap();

        let update = ProfileUpdate {
            balance: Some(dec!(4500.50)),
            face_data: Some("new_face".to_string()),
            ..Default::default()
        };
        assert!(store.update_user(1001, update).unwrap());
        assert!(!store.update_user(1002, ProfileUpdate::default()).unwrap());

        let detail = store.get_user_detail(1001).unwrap();
        assert_eq!(detail.profile.balance, dec!(4500.50));
        assert_eq!(detail.stored_face.as_deref(), Some("new_face"));
        assert_eq!(detail.profile.email.as_deref(), Some("angel_abubakar@gmail.com"));
    }

    #[test]
    fn test_trusted_devices_are_unique() {
        let mut store = UserStore::in_memory();
        store.add_user(1001, angel()).unwrap();

        assert!(store.add_trusted_device(1001, TRUSTED_DEVICE).unwrap());
        assert!(store.add_trusted_device(1001, TRUSTED_DEVICE).unwrap());
        assert!(!store.add_trusted_device(1002, TRUSTED_DEVICE).unwrap());

        assert_eq!(store.get_user_detail(1001).unwrap().trusted_devices.len(), 1);
    }

    #[test]
    fn test_login_record_for_unknown_user() {
        let mut store = UserStore::in_memory();
        let now = FixedClock::at_hour(10).now();

        assert!(!store.add_login_record(1001, login_at(now)).unwrap());
    }

    #[test]
    fn test_familiar_login_has_no_anomalies() {
        let now = FixedClock::at_hour(10).now();
        let store = seeded_store(now);
        let payload = LoginPayload {
            device_info: Some(TRUSTED_DEVICE.to_string()),
            location: Some(DAMASCUS.to_string()),
            ..Default::default()
        };

        let comparison = store.compare_with_current(1001, &payload, now).unwrap();

        assert!(comparison.anomalies.is_empty());
        assert!(!comparison.is_suspicious);
    }

    #[test]
    fn test_suspicious_login() {
        let now = FixedClock::at_hour(10).now();
        let store = seeded_store(now);
        let payload = LoginPayload {
            device_info: Some("Unknown Device".to_string()),
            location: Some("1.2921,36.8219".to_string()),
            ..Default::default()
        };

        let comparison = store.compare_with_current(1001, &payload, now).unwrap();

        assert_eq!(
            comparison.anomalies,
            vec![Anomaly::UntrustedDevice, Anomaly::UnusualLocation]
        );
        assert_eq!(comparison.anomaly_count, 2);
        assert!(comparison.is_suspicious);
    }

    #[test]
    fn test_partial_device_match_is_trusted() {
        let now = FixedClock::at_hour(10).now();
        let store = seeded_store(now);
        let payload = LoginPayload {
            device_info: Some("Windows 11".to_string()),
            ..Default::default()
        };

        let comparison = store.compare_with_current(1001, &payload, now).unwrap();

        assert!(comparison.anomalies.is_empty());
    }

    #[test]
    fn test_hour_seen_once_is_unusual() {
        let now = FixedClock::at_hour(10).now();
        let mut store = UserStore::in_memory();
        store.add_user(1001, angel()).unwrap();
        store.add_login_record(1001, login_at(now)).unwrap();
        store.add_login_record(1001, login_at(now - Duration::hours(3))).unwrap();
        store.add_login_record(1001, login_at(now - Duration::hours(3))).unwrap();

        let at_ten = store.compare_with_current(1001, &LoginPayload::default(), now).unwrap();
        assert_eq!(at_ten.anomalies, vec![Anomaly::UnusualLoginTime]);

        let at_seven = store
            .compare_with_current(1001, &LoginPayload::default(), now - Duration::hours(3))
            .unwrap();
        assert!(at_seven.anomalies.is_empty());

        let never_seen = store
            .compare_with_current(1001, &LoginPayload::default(), now + Duration::hours(5))
            .unwrap();
        assert!(never_seen.anomalies.is_empty());
    }

    #[test]
    fn test_compare_unknown_user() {
        let store = UserStore::in_memory();
        let now = FixedClock::at_hour(10).now();

        let result = store.compare_with_current(42, &LoginPayload::default(), now);

        assert!(matches!(result, Err(BankError::UserNotFound(42))));
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("user_data.json");
        let now = FixedClock::at_hour(10).now();

        {
            let mut store = UserStore::open(&path).unwrap();
            assert!(store.is_empty());
            store.add_user(1001, angel()).unwrap();
            store.add_trusted_device(1001, TRUSTED_DEVICE).unwrap();
            store.add_login_record(1001, login_at(now)).unwrap();
        }

        let reopened = UserStore::open(&path).unwrap();
        let detail = reopened.get_user_detail(1001).unwrap();

        assert_eq!(reopened.len(), 1);
        assert_eq!(detail.profile.balance, dec!(5000));
        assert_eq!(detail.trusted_devices, vec![TRUSTED_DEVICE.to_string()]);
        assert_eq!(detail.historical_locations(), vec![DAMASCUS.to_string()]);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("data");
        fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("user_data.json");

        let mut store = UserStore::open(&path).unwrap();

        assert!(matches!(store.add_user(1001, angel()), Err(BankError::Io(_))));
        assert!(!store.contains(1001));

        fs::remove_file(&blocker).unwrap();
        assert!(store.add_user(1001, angel()).unwrap());

        fs::remove_dir_all(&blocker).unwrap();
        fs::write(&blocker, "not a directory").unwrap();
        let now = FixedClock::at_hour(10).now();

        assert!(store.add_login_record(1001, login_at(now)).is_err());
        assert!(store.add_trusted_device(1001, TRUSTED_DEVICE).is_err());
        let update = ProfileUpdate {
            balance: Some(dec!(1)),
            ..Default::default()
        };
        assert!(store.update_user(1001, update).is_err());

        let detail = store.get_user_detail(1001).unwrap();
        assert!(detail.historical_logins.is_empty());
        assert!(detail.trusted_devices.is_empty());
        assert_eq!(detail.profile.balance, dec!(5000));
    }

    #[test]
    fn test_login_history_is_bounded() {
        let now = FixedClock::at_hour(10).now();
        let mut store = UserStore::in_memory().with_login_history_capacity(3);
        store.add_user(1001, angel()).unwrap();

        for i in 0..5 {
            store.add_login_record(1001, login_at(now + Duration::minutes(i))).unwrap();
        }

        let logins = store.get_user_detail(1001).unwrap().historical_logins;
        assert_eq!(logins.len(), 3);
        assert_eq!(logins[0].timestamp, now + Duration::minutes(2));
        assert_eq!(logins[2].timestamp, now + Duration::minutes(4));
    }

    #[test]
    fn test_open_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user_data.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(UserStore::open(&path), Err(BankError::Serialization(_))));
    }
}
