pub mod login;

pub use login::{LoginInterface, SessionStatus};
