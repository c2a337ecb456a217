//! Transfer records and their canonical serialization.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when constructing a transaction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransactionError {
    #[error("amount must be a finite non-negative number, got {0}")]
    InvalidAmount(f64),

    #[error("timestamp must be finite, got {0}")]
    InvalidTimestamp(f64),
}

/// A value transfer between two addresses.
///
/// Fields are private so every instance has passed [`Transaction::new`]'s
/// checks, including ones produced by deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionFields")]
pub struct Transaction {
    sender: Address,
    recipient: Address,
    amount: f64,
    timestamp: f64,
}

/// Unchecked wire form, validated into a [`Transaction`].
#[derive(Deserialize)]
struct TransactionFields {
    sender: Address,
    recipient: Address,
    amount: f64,
    timestamp: f64,
}

impl TryFrom<TransactionFields> for Transaction {
    type Error = TransactionError;

    fn try_from(f: TransactionFields) -> Result<Self, Self::Error> {
        Transaction::new(f.sender, f.recipient, f.amount, f.timestamp)
    }
}

/// Hashing view: fields in alphabetical order.
#[derive(Serialize)]
struct CanonicalTransaction<'a> {
    amount: f64,
    recipient: &'a Address,
    sender: &'a Address,
    timestamp: f64,
}

impl Transaction {
    /// Create a transaction with an explicit timestamp.
    pub fn new(
        sender: Address,
        recipient: Address,
        amount: f64,
        timestamp: f64,
    ) -> Result<Self, TransactionError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(TransactionError::InvalidAmount(amount));
        }
        if !timestamp.is_finite() {
            return Err(TransactionError::InvalidTimestamp(timestamp));
        }
        Ok(Self {
            sender,
            recipient,
            amount,
            timestamp,
        })
    }

    /// Create a transfer stamped with the current time.
    pub fn transfer(
        sender: Address,
        recipient: Address,
        amount: f64,
    ) -> Result<Self, TransactionError> {
        Self::new(sender, recipient, amount, crate::unix_timestamp())
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn canonical(&self) -> CanonicalTransaction<'_> {
        CanonicalTransaction {
            amount: self.amount,
            recipient: &self.recipient,
            sender: &self.sender,
            timestamp: self.timestamp,
        }
    }
}

/// Serialize a transaction list for hashing.
///
/// Compact JSON array, object keys sorted, no whitespace. The byte form is
/// part of the block hash contract and must not change.
pub fn canonical_payload(transactions: &[Transaction]) -> Vec<u8> {
    let view: Vec<_> = transactions.iter().map(Transaction::canonical).collect();
    serde_json::to_vec(&view).expect("transaction serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(nibble: &str) -> Address {
        Address::from_hex(&nibble.repeat(64)).unwrap()
    }

    #[test]
    fn test_rejects_negative_amount() {
        assert_eq!(
            Transaction::new(addr("a"), addr("b"), -1.0, 0.0),
            Err(TransactionError::InvalidAmount(-1.0))
        );
        assert!(Transaction::new(addr("a"), addr("b"), f64::NAN, 0.0).is_err());
        assert!(Transaction::new(addr("a"), addr("b"), 1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_zero_amount_allowed() {
        let tx = Transaction::new(Address::ZERO, Address::ZERO, 0.0, 1.0).unwrap();
        assert_eq!(tx.amount(), 0.0);
    }

    #[test]
    fn test_canonical_payload_byte_form() {
        let tx = Transaction::new(addr("a"), addr("b"), 10.0, 1700000000.5).unwrap();
        let payload = String::from_utf8(canonical_payload(&[tx])).unwrap();
        let expected = format!(
            "[{{\"amount\":10.0,\"recipient\":\"{}\",\"sender\":\"{}\",\"timestamp\":1700000000.5}}]",
            "b".repeat(64),
            "a".repeat(64)
        );
        assert_eq!(payload, expected);
    }

    #[test]
    fn test_canonical_payload_empty() {
        assert_eq!(canonical_payload(&[]), b"[]");
    }

    #[test]
    fn test_persisted_field_order() {
        let tx = Transaction::new(addr("a"), addr("b"), 1.25, 2.0).unwrap();
        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.starts_with("{\"sender\":"));
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_deserialize_validates_amount() {
        let json = format!(
            "{{\"sender\":\"{}\",\"recipient\":\"{}\",\"amount\":-5.0,\"timestamp\":1.0}}",
            "a".repeat(64),
            "b".repeat(64)
        );
        assert!(serde_json::from_str::<Transaction>(&json).is_err());
    }
}
