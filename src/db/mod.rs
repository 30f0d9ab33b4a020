// src/db/mod.rs
pub mod user_store;

pub use user_store::{
    Anomaly, LoginComparison, LoginRecord, ProfileUpdate, UserDetail, UserProfile, UserStore,
};
