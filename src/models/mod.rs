// Domain models shared by the login pipeline, the user directory and the defense layer
pub mod customer;
pub mod payload;
pub mod transaction;

pub use customer::{Customer, CustomerId};
pub use payload::LoginPayload;
pub use transaction::{Transaction, TransactionStatus};
