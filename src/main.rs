use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use log::{info, warn};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::path::PathBuf;

use secure_banking::ai::{AIEngine, VerificationFactor};
use secure_banking::config::{self, Settings};
use secure_banking::db::{LoginRecord, UserProfile, UserStore};
use secure_banking::interfaces::LoginInterface;
use secure_banking::models::Customer;
use secure_banking::security::{
    ActivityData, AuthenticationSystem, PasswordService, ProactiveDefenseSystem,
};
use secure_banking::utils::{format_score, logging};

const DEMO_CUSTOMER_ID: u64 = 1001;
const DEMO_DEVICE: &str = "Windows 11, Chrome 98.0.4758.102";
const DEMO_LOCATION: &str = "33.5102,36.29128";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Login session id (defaults to the current unix time)
    #[arg(long)]
    session_id: Option<u64>,

    /// Replace device, location and IP with unfamiliar values
    #[arg(long)]
    suspicious: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };

    // Initialize logging
    logging::init_logger(&settings.logging);

    let customer = Customer::new(DEMO_CUSTOMER_ID, "angel_abubakar", "Password@123")
        .with_biometrics("base64_encoded_face_data_for_angel", "angel_typing_pattern_data");

    let mut store = UserStore::open(&settings.storage.user_data_file)
        .context("Failed to open user store")?
        .with_login_history_capacity(settings.storage.login_history_capacity);
    seed_demo_customer(&mut store, &customer)?;

    let session_id = cli
        .session_id
        .unwrap_or_else(|| u64::try_from(Utc::now().timestamp()).unwrap_or_default());

    run_login(&settings, &mut store, &customer, session_id, cli.suspicious)
}

fn seed_demo_customer(store: &mut UserStore, customer: &Customer) -> Result<()> {
    if store.contains(customer.customer_id) {
        return Ok(());
    }

    let password_hash = PasswordService::default()
        .hash_password(&customer.password)
        .context("Failed to hash demo password")?;

    let profile = UserProfile {
        username: customer.username.clone(),
        password_hash: Some(password_hash),
        email: Some("angel_abubakar@gmail.com".to_string()),
        phone: Some("+963123456789".to_string()),
        balance: dec!(5000),
        face_data: customer.face_data.clone(),
        typing_pattern: customer.typing_pattern.clone(),
    };

    store.add_user(customer.customer_id, profile)?;
    store.add_trusted_device(customer.customer_id, DEMO_DEVICE)?;

    for _ in 0..3 {
        let record = LoginRecord {
            timestamp: Local::now(),
            device_info: Some(DEMO_DEVICE.to_string()),
            location: Some(DEMO_LOCATION.to_string()),
            ip_address: Some("192.168.1.1".to_string()),
            success: true,
            risk_level: None,
        };
        store.add_login_record(customer.customer_id, record)?;
    }

    info!("Seeded demo customer {}", customer);
    Ok(())
}

fn run_login(
    settings: &Settings,
    store: &mut UserStore,
    customer: &Customer,
    session_id: u64,
    suspicious: bool,
) -> Result<()> {
    let interface = LoginInterface::new(session_id);
    let mut auth_system = AuthenticationSystem::new(settings.security.clone());
    let mut ai_engine = AIEngine::new(&settings.ai);

    customer.login();

    let mut payload = interface.collect_input();
    customer.fill_payload(&mut payload);
    if suspicious {
        payload.device_info = Some("Unknown Device".to_string());
        payload.location = Some("1.2921,36.8219".to_string());
        payload.ip_address = Some("203.0.113.42".to_string());
    }

    interface.send_to_authentication(&payload);
    let outcome = auth_system.authenticate(&payload);

    let detail = store
        .get_user_detail(customer.customer_id)
        .with_context(|| format!("User {} not found", customer.customer_id))?;

    let mut results = HashMap::new();
    if let (Some(face), Some(stored)) = (payload.face_data(), detail.stored_face.as_deref()) {
        results.insert(VerificationFactor::Face, ai_engine.verify_face(face, stored));
    }
    if let (Some(pattern), Some(stored)) = (payload.typing_pattern(), detail.stored_typing_pattern.as_deref()) {
        results.insert(VerificationFactor::Typing, ai_engine.analyze_typing(pattern, stored));
    }
    if let Some(location) = payload.location() {
        let history = detail.historical_locations();
        results.insert(VerificationFactor::Location, ai_engine.verify_location(location, &history));
    }
    if let Some(device) = payload.device_info() {
        results.insert(VerificationFactor::Device, ai_engine.verify_device(device, &detail.trusted_devices));
    }

    let ai_risk = ai_engine.predict_risk_level(&results);
    let comparison = store.compare_with_current(customer.customer_id, &payload, Local::now())?;

    println!("{}", interface);
    println!(
        "Authentication: success={} risk={} additional_verification={}",
        outcome.success,
        format_score(outcome.risk_level),
        outcome.additional_verification_required
    );
    for factor in &outcome.risk_factors {
        println!("  risk factor: {}", factor);
    }
    println!("AI risk level: {}", format_score(ai_risk));
    if !comparison.anomalies.is_empty() {
        let anomalies: Vec<String> = comparison.anomalies.iter().map(|a| a.to_string()).collect();
        println!("Detected anomalies: {}", anomalies.join(", "));
    }

    if outcome.additional_verification_required {
        let request = auth_system.request_additional_verification("sms");
        println!(
            "Additional verification ({}) expires at {}",
            request.verification_type, request.expires_at
        );
    }

    let accepted = outcome.success && ai_risk < settings.security.risk_threshold;
    let record = LoginRecord::from_payload(&payload, outcome.timestamp, accepted).with_risk_level(ai_risk);
    store.add_login_record(customer.customer_id, record)?;

    if accepted {
        println!("Login accepted for {}", customer.username);
    } else {
        warn!("Login denied for {}", customer.username);
        println!("Login denied for {}", customer.username);
        respond_to_denied_login(settings, customer, payload.ip_address(), ai_risk);
    }

    let stats = ai_engine.get_verification_stats();
    println!(
        "Verification stats: attempts={} successful={} flagged={} success_rate={}",
        stats.total_attempts,
        stats.successful_verifications,
        stats.flagged_attempts,
        format_score(stats.success_rate)
    );

    Ok(())
}

fn respond_to_denied_login(
    settings: &Settings,
    customer: &Customer,
    ip_address: Option<&str>,
    risk_level: f64,
) {
    let mut defense = ProactiveDefenseSystem::new(settings.defense.clone());

    let activity = ActivityData {
        username: Some(customer.username.clone()),
        login_attempts: Some(1),
        ip_address: ip_address.map(str::to_string),
        risk_level: Some(risk_level),
        ..Default::default()
    };

    let assessment = defense.detect_threat(&activity);
    if assessment.threat_detected {
        println!("Threat level {}: {}", assessment.threat_level, assessment.response_plan);
    }

    if let Some(ip) = ip_address {
        if risk_level > 0.8 {
            defense.block_access(ip, "High risk login attempt");
            println!("Blocked access from IP: {}", ip);
        }
    }

    defense.alert_security_team(
        &format!("Suspicious login attempt for user {}", customer.username),
        None,
    );
    println!("Security status: {:?}", defense.get_security_status());
}
