//! Core ledger primitives for powbench.
//!
//! This crate provides the data model the miners operate over:
//! - SHA-256 digests and the canonical block hash contract
//! - Addresses
//! - Transactions and their canonical serialization
//! - Hashed blocks and mining templates

pub mod address;
pub mod block;
pub mod hash;
pub mod transaction;

use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at the crate root
pub use address::Address;
pub use block::{BlockTemplate, HashedBlock};
pub use hash::{block_digest, hash, Hash, HashParseError, DIGEST_HEX_LEN, H256};
pub use transaction::{canonical_payload, Transaction, TransactionError};

/// Current Unix time in seconds, with sub-second precision.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
