use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use super::CustomerId;
use crate::error::Result;

/// Status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Blocked,
    UnderReview,
}

/// A transfer between two customers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub sender_id: CustomerId,
    pub receiver_id: CustomerId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Transaction {
    pub fn new(sender_id: CustomerId, receiver_id: CustomerId, amount: Decimal, description: &str) -> Self {
        Transaction {
            transaction_id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            amount,
            timestamp: Utc::now(),
            status: TransactionStatus::Pending,
            description: description.to_string(),
            risk_score: 0.0,
            metadata: HashMap::new(),
        }
    }

    /// Mark as completed. Only pending transactions complete.
    pub fn complete(&mut self) -> bool {
        if self.status != TransactionStatus::Pending {
            return false;
        }

        self.transition(TransactionStatus::Completed, "completed_at");
        true
    }

    /// Mark as failed. Anything that has not completed can fail.
    pub fn fail(&mut self, reason: &str) -> bool {
        if self.status == TransactionStatus::Completed {
            return false;
        }

        self.transition(TransactionStatus::Failed, "failed_at");
        self.metadata.insert("failure_reason".to_string(), reason.to_string());
        true
    }

    /// Block for security reasons. Only pending transactions can be blocked.
    pub fn block(&mut self, reason: &str) -> bool {
        if self.status != TransactionStatus::Pending {
            return false;
        }

        self.transition(TransactionStatus::Blocked, "blocked_at");
        self.metadata.insert("block_reason".to_string(), reason.to_string());
        true
    }

    /// Hold for manual review with the score that triggered it
    pub fn flag_for_review(&mut self, risk_score: f64) -> bool {
        if self.status != TransactionStatus::Pending {
            return false;
        }

        self.transition(TransactionStatus::UnderReview, "flagged_at");
        self.risk_score = risk_score;
        self.metadata.insert("risk_score".to_string(), risk_score.to_string());
        true
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    fn transition(&mut self, status: TransactionStatus, stamp_key: &str) {
        debug!("Transaction {} {:?} -> {:?}", self.transaction_id, self.status, status);
        self.status = status;
        self.metadata.insert(stamp_key.to_string(), Utc::now().to_rfc3339());
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction(id={}, amount={}, status={:?})",
            self.transaction_id, self.amount, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending() -> Transaction {
        Transaction::new(1001, 1002, dec!(500.00), "Payment from angel_abubakar to ahmad_ali")
    }

    #[test]
    fn test_complete_only_from_pending() {
        let mut tx = pending();

        assert!(tx.complete());
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert!(tx.metadata.contains_key("completed_at"));

        assert!(!tx.complete());
        assert!(!tx.fail("too late"));
        assert_eq!(tx.status, TransactionStatus::Completed);
    }

    #[test]
    fn test_fail_from_review() {
        let mut tx = pending();

        assert!(tx.flag_for_review(0.85));
        assert_eq!(tx.risk_score, 0.85);

        assert!(!tx.block("no longer pending"));
        assert!(tx.fail("Insufficient balance"));
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.metadata["failure_reason"], "Insufficient balance");
    }

    #[test]
    fn test_block_records_reason() {
        let mut tx = pending();

        assert!(tx.block("Sanctioned receiver"));
        assert_eq!(tx.status, TransactionStatus::Blocked);
        assert_eq!(tx.metadata["block_reason"], "Sanctioned receiver");
        assert!(!tx.complete());
    }

    #[test]
    fn test_json_keeps_identity_and_status() {
        let mut tx = pending();
        tx.flag_for_review(0.75);

        let restored = Transaction::from_json(&tx.to_json().unwrap()).unwrap();

        assert_eq!(restored.transaction_id, tx.transaction_id);
        assert_eq!(restored.amount, dec!(500.00));
        assert_eq!(restored.status, TransactionStatus::UnderReview);
    }

    #[test]
    fn test_from_json_rejects_missing_amount() {
        let result = Transaction::from_json(r#"{"sender_id": 1, "receiver_id": 2}"#);
        assert!(result.is_err());
    }
}
