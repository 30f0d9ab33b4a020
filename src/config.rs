use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";

/// Top-level settings, one section per subsystem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub security: SecuritySettings,
    pub ai: AiSettings,
    pub defense: DefenseSettings,
    pub storage: StorageSettings,
    pub logging: LogSettings,
}

/// Login risk heuristic and session policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Attempts at or above this risk are rejected
    pub risk_threshold: f64,
    /// Attempts at or above this risk (but under the threshold) need a second factor
    pub additional_verification_floor: f64,
    pub missing_face_weight: f64,
    pub missing_typing_weight: f64,
    pub unusual_hour_weight: f64,
    /// Inclusive range of local hours treated as an unusual login time
    pub unusual_hours_start: u32,
    pub unusual_hours_end: u32,
    pub history_capacity: usize,
    pub verification_expiry_minutes: i64,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        SecuritySettings {
            risk_threshold: 0.7,
            additional_verification_floor: 0.3,
            missing_face_weight: 0.3,
            missing_typing_weight: 0.3,
            unusual_hour_weight: 0.25,
            unusual_hours_start: 0,
            unusual_hours_end: 5,
            history_capacity: 100,
            verification_expiry_minutes: 5,
        }
    }
}

/// Verifier model names and aggregation weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub face_model: String,
    pub typing_model: String,
    pub location_model: String,
    pub weights: RiskWeights,
}

impl Default for AiSettings {
    fn default() -> Self {
        AiSettings {
            face_model: "FaceNet_v2".to_string(),
            typing_model: "KeystrokeDynamics_v1".to_string(),
            location_model: "GeoVerify_v3".to_string(),
            weights: RiskWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub face: f64,
    pub typing: f64,
    pub location: f64,
    pub device: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        RiskWeights {
            face: 0.35,
            typing: 0.25,
            location: 0.2,
            device: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseSettings {
    pub brute_force_attempts: u32,
    pub large_transaction_amount: f64,
    pub large_transaction_flag_probability: f64,
    pub alert_capacity: usize,
}

impl Default for DefenseSettings {
    fn default() -> Self {
        DefenseSettings {
            brute_force_attempts: 5,
            large_transaction_amount: 10000.0,
            large_transaction_flag_probability: 0.3,
            alert_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub user_data_file: PathBuf,
    /// Login records kept per customer
    pub login_history_capacity: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            user_data_file: PathBuf::from("data").join("user_data.json"),
            login_history_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub directory: PathBuf,
    pub max_files: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".to_string(),
            directory: PathBuf::from("data").join("logs"),
            max_files: 10,
        }
    }
}

impl Settings {
    /// Get a single configuration section by name
    pub fn section(&self, name: &str) -> Option<toml::Value> {
        let value = match name.to_lowercase().as_str() {
            "security" => toml::Value::try_from(&self.security),
            "ai" => toml::Value::try_from(&self.ai),
            "defense" => toml::Value::try_from(&self.defense),
            "storage" => toml::Value::try_from(&self.storage),
            "logging" => toml::Value::try_from(&self.logging),
            _ => return None,
        };

        value.ok()
    }
}

/// Load configuration from `.env`, an optional TOML file and the environment
pub fn load_config() -> Result<Settings> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let path = env::var("BANK_CONFIG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_config_from(&path)
}

/// Load configuration with an explicit file path. A missing file falls back to defaults.
pub fn load_config_from(path: &Path) -> Result<Settings> {
    let mut config = if path.exists() {
        load_from_file(path)?
    } else {
        Settings::default()
    };

    load_from_env(&mut config);

    Ok(config)
}

/// Load configuration from a TOML file
fn load_from_file(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))
}

/// Apply environment variable overrides
fn load_from_env(config: &mut Settings) {
    if let Ok(level) = env::var("LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Ok(dir) = env::var("LOG_DIR") {
        config.logging.directory = PathBuf::from(dir);
    }

    if let Ok(file) = env::var("USER_DATA_FILE") {
        config.storage.user_data_file = PathBuf::from(file);
    }

    if let Ok(capacity) = env::var("AUTH_HISTORY_CAPACITY") {
        if let Ok(capacity) = capacity.parse() {
            config.security.history_capacity = capacity;
        }
    }

    if let Ok(threshold) = env::var("AUTH_RISK_THRESHOLD") {
        if let Ok(threshold) = threshold.parse() {
            config.security.risk_threshold = threshold;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Tests touching process environment run one at a time
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 5] = [
        "LOG_LEVEL",
        "LOG_DIR",
        "USER_DATA_FILE",
        "AUTH_HISTORY_CAPACITY",
        "AUTH_RISK_THRESHOLD",
    ];

    fn clear_overrides() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_env_overrides_apply() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();

        env::set_var("LOG_LEVEL", "debug");
        env::set_var("LOG_DIR", "/tmp/banking-logs");
        env::set_var("USER_DATA_FILE", "/tmp/banking-users.json");
        env::set_var("AUTH_HISTORY_CAPACITY", "25");
        env::set_var("AUTH_RISK_THRESHOLD", "0.55");

        let mut settings = Settings::default();
        load_from_env(&mut settings);
        clear_overrides();

        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.directory, PathBuf::from("/tmp/banking-logs"));
        assert_eq!(settings.storage.user_data_file, PathBuf::from("/tmp/banking-users.json"));
        assert_eq!(settings.security.history_capacity, 25);
        assert_eq!(settings.security.risk_threshold, 0.55);
    }

    #[test]
    fn test_unparseable_numbers_keep_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();

        env::set_var("AUTH_HISTORY_CAPACITY", "lots");
        env::set_var("AUTH_RISK_THRESHOLD", "high");

        let mut settings = Settings::default();
        load_from_env(&mut settings);
        clear_overrides();

        assert_eq!(settings.security.history_capacity, 100);
        assert_eq!(settings.security.risk_threshold, 0.7);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();

        let settings = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(settings.security.history_capacity, 100);
        assert_eq!(settings.security.risk_threshold, 0.7);
        assert_eq!(settings.storage.login_history_capacity, 100);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_file_then_env_precedence() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[security]\nhistory_capacity = 7\nrisk_threshold = 0.6").unwrap();

        env::set_var("AUTH_HISTORY_CAPACITY", "9");
        let settings = load_config_from(file.path());
        clear_overrides();
        let settings = settings.unwrap();

        assert_eq!(settings.security.history_capacity, 9);
        assert_eq!(settings.security.risk_threshold, 0.6);
    }

    #[test]
    fn test_defaults_match_login_policy() {
        let settings = Settings::default();

        assert_eq!(settings.security.risk_threshold, 0.7);
        assert_eq!(settings.security.additional_verification_floor, 0.3);
        assert_eq!(settings.security.unusual_hours_start, 0);
        assert_eq!(settings.security.unusual_hours_end, 5);
        assert_eq!(settings.ai.weights, RiskWeights::default());
        assert_eq!(settings.ai.face_model, "FaceNet_v2");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[security]\nhistory_capacity = 7\n\n[ai]\nface_model = \"FaceNet_v3\"").unwrap();

        let settings = load_from_file(file.path()).unwrap();

        assert_eq!(settings.security.history_capacity, 7);
        assert_eq!(settings.security.risk_threshold, 0.7);
        assert_eq!(settings.ai.face_model, "FaceNet_v3");
        assert_eq!(settings.ai.typing_model, "KeystrokeDynamics_v1");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[security\nrisk_threshold = ").unwrap();

        assert!(load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_section_lookup() {
        let settings = Settings::default();

        let ai = settings.section("AI").unwrap();
        assert_eq!(ai.get("location_model").and_then(|v| v.as_str()), Some("GeoVerify_v3"));

        assert!(settings.section("notification").is_none());
    }
}
