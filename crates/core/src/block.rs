//! Hashed blocks and mining templates.

use crate::address::Address;
use crate::hash::{block_digest, Hash};
use crate::transaction::{canonical_payload, Transaction};
use serde::{Deserialize, Serialize};

/// A block whose `hash` commits to every other field.
///
/// The persisted field order is `previous_hash, timestamp, nonce,
/// transactions, hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashedBlock {
    /// Hash of the previous block.
    pub previous_hash: Hash,
    /// Unix timestamp in seconds, shared by every candidate of one search.
    pub timestamp: f64,
    /// Proof-of-work nonce.
    pub nonce: u64,
    /// Ordered transactions; order is part of the digest.
    pub transactions: Vec<Transaction>,
    /// Claimed digest of the fields above.
    pub hash: Hash,
}

impl HashedBlock {
    /// Build a block and compute its digest.
    pub fn new(
        previous_hash: Hash,
        transactions: Vec<Transaction>,
        timestamp: f64,
        nonce: u64,
    ) -> Self {
        let hash = block_digest(
            &previous_hash,
            timestamp,
            nonce,
            &canonical_payload(&transactions),
        );
        Self {
            previous_hash,
            timestamp,
            nonce,
            transactions,
            hash,
        }
    }

    /// Create the genesis block.
    ///
    /// Zero previous hash, nonce 0 and one zero-amount transfer from and to
    /// the zero address, all stamped with `timestamp`.
    pub fn genesis(timestamp: f64) -> Self {
        let tx = Transaction::new(Address::ZERO, Address::ZERO, 0.0, timestamp)
            .expect("genesis transaction is well formed");
        Self::new(Hash::ZERO, vec![tx], timestamp, 0)
    }

    /// Recompute the digest from the block's fields.
    pub fn compute_hash(&self) -> Hash {
        block_digest(
            &self.previous_hash,
            self.timestamp,
            self.nonce,
            &canonical_payload(&self.transactions),
        )
    }

    /// Check that the stored hash matches the fields.
    pub fn has_valid_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Check the stored hash against a difficulty prefix.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.hash.meets_difficulty(difficulty)
    }

    /// Check if this block has the genesis shape.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash == Hash::ZERO && self.nonce == 0
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

/// The nonce-independent part of a block under search.
///
/// The transaction payload is serialized once, so hashing a candidate only
/// costs the digest itself.
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    previous_hash: Hash,
    timestamp: f64,
    transactions: Vec<Transaction>,
    payload: Vec<u8>,
}

impl BlockTemplate {
    pub fn new(previous_hash: Hash, transactions: Vec<Transaction>, timestamp: f64) -> Self {
        let payload = canonical_payload(&transactions);
        Self {
            previous_hash,
            timestamp,
            transactions,
            payload,
        }
    }

    /// Template stamped with the current time.
    pub fn now(previous_hash: Hash, transactions: Vec<Transaction>) -> Self {
        Self::new(previous_hash, transactions, crate::unix_timestamp())
    }

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Digest of the candidate with the given nonce.
    pub fn digest(&self, nonce: u64) -> Hash {
        block_digest(&self.previous_hash, self.timestamp, nonce, &self.payload)
    }

    /// Build the block for `nonce` with its computed digest.
    pub fn seal(&self, nonce: u64) -> HashedBlock {
        self.seal_reported(nonce, self.digest(nonce))
    }

    /// Build the block for `nonce` trusting a digest reported by a worker.
    ///
    /// The result is not re-verified here; chain validation checks it.
    pub fn seal_reported(&self, nonce: u64, hash: Hash) -> HashedBlock {
        HashedBlock {
            previous_hash: self.previous_hash,
            timestamp: self.timestamp,
            nonce,
            transactions: self.transactions.clone(),
            hash,
        }
    }
}
