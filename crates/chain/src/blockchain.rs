//! The append-only chain and its validation rules.
//!
//! A chain always holds its genesis block. Every append runs the full set of
//! checks against the current tip and either pushes the block or leaves the
//! chain untouched.

use powbench_core::{unix_timestamp, Hash, HashedBlock};
use powbench_storage::{ChainDocument, StorageError};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Reasons a candidate block is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("previous hash mismatch (expected {expected}, got {got})")]
    Linkage { expected: Hash, got: Hash },

    #[error("block hash mismatch (stored {stored}, computed {computed})")]
    HashMismatch { stored: Hash, computed: Hash },

    #[error("hash {hash} does not start with {difficulty} zeros")]
    DifficultyNotMet { difficulty: usize, hash: Hash },

    #[error("block contains no transactions")]
    EmptyBlock,
}

/// Errors from building or checking a whole chain.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid block: {0}")]
    Validation(#[from] ValidationError),

    #[error("corrupt chain at block {index}: {reason}")]
    Corrupt { index: usize, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// Run every check of `candidate` against `tip`, in rule order.
fn check_block(tip: &HashedBlock, candidate: &HashedBlock, difficulty: usize) -> Vec<ValidationError> {
    let mut violations = Vec::new();

    if candidate.previous_hash != tip.hash {
        violations.push(ValidationError::Linkage {
            expected: tip.hash,
            got: candidate.previous_hash,
        });
    }

    let computed = candidate.compute_hash();
    if computed != candidate.hash {
        violations.push(ValidationError::HashMismatch {
            stored: candidate.hash,
            computed,
        });
    }

    if !candidate.meets_difficulty(difficulty) {
        violations.push(ValidationError::DifficultyNotMet {
            difficulty,
            hash: candidate.hash,
        });
    }

    if candidate.transactions.is_empty() {
        violations.push(ValidationError::EmptyBlock);
    }

    violations
}

/// Ordered, append-only list of blocks starting at genesis.
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<HashedBlock>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// Create a chain whose genesis is stamped with the current time.
    pub fn new() -> Self {
        Self::with_genesis_timestamp(unix_timestamp())
    }

    /// Create a chain with a caller-chosen genesis timestamp.
    pub fn with_genesis_timestamp(timestamp: f64) -> Self {
        Self {
            blocks: vec![HashedBlock::genesis(timestamp)],
        }
    }

    /// Rebuild a chain from persisted blocks.
    ///
    /// The first block must equal the genesis block for its own timestamp and
    /// every later block must pass the append checks at difficulty 0.
    pub fn restore(blocks: Vec<HashedBlock>) -> Result<Self> {
        let genesis = blocks.first().ok_or_else(|| ChainError::Corrupt {
            index: 0,
            reason: "no blocks".to_string(),
        })?;
        if !genesis.has_valid_hash() {
            return Err(ChainError::Corrupt {
                index: 0,
                reason: format!("stored hash {} does not match its fields", genesis.hash),
            });
        }
        if !genesis.timestamp.is_finite() || *genesis != HashedBlock::genesis(genesis.timestamp) {
            return Err(ChainError::Corrupt {
                index: 0,
                reason: "first block is not a genesis block".to_string(),
            });
        }

        for (index, pair) in blocks.windows(2).enumerate() {
            if let Some(violation) = check_block(&pair[0], &pair[1], 0).into_iter().next() {
                return Err(ChainError::Corrupt {
                    index: index + 1,
                    reason: violation.to_string(),
                });
            }
        }

        Ok(Self { blocks })
    }

    /// Rebuild a chain from a checked document.
    pub fn from_document(doc: ChainDocument) -> Result<Self> {
        doc.check()?;
        Self::restore(doc.blocks)
    }

    /// Snapshot of the chain in its persisted form.
    pub fn to_document(&self) -> ChainDocument {
        ChainDocument::new(self.blocks.clone())
    }

    /// Load a chain file and rebuild the chain it holds.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::restore(ChainDocument::load(path)?.blocks)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Ok(self.to_document().save(path)?)
    }

    pub fn genesis(&self) -> &HashedBlock {
        &self.blocks[0]
    }

    /// The most recently appended block.
    pub fn tip(&self) -> &HashedBlock {
        self.blocks.last().expect("chain always holds genesis")
    }

    pub fn tip_hash(&self) -> Hash {
        self.tip().hash
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Never true once constructed.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[HashedBlock] {
        &self.blocks
    }

    /// Every rule `candidate` breaks against the current tip.
    pub fn violations(&self, candidate: &HashedBlock, difficulty: usize) -> Vec<ValidationError> {
        let violations = check_block(self.tip(), candidate, difficulty);
        for violation in &violations {
            warn!(height = self.len(), nonce = candidate.nonce, %violation, "block check failed");
        }
        violations
    }

    /// Check `candidate` against the tip, returning the first broken rule.
    pub fn validate(
        &self,
        candidate: &HashedBlock,
        difficulty: usize,
    ) -> std::result::Result<(), ValidationError> {
        match self.violations(candidate, difficulty).into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Validate and push a block.
    pub fn append(
        &mut self,
        block: HashedBlock,
        difficulty: usize,
    ) -> std::result::Result<(), ValidationError> {
        self.validate(&block, difficulty)?;
        info!(height = self.len(), nonce = block.nonce, hash = %block.hash, "block appended");
        self.blocks.push(block);
        Ok(())
    }

    /// Re-check every block after genesis against `difficulty`.
    pub fn verify(&self, difficulty: usize) -> Result<()> {
        for (index, pair) in self.blocks.windows(2).enumerate() {
            if let Some(violation) = check_block(&pair[0], &pair[1], difficulty).into_iter().next() {
                warn!(index = index + 1, %violation, "stored block failed verification");
                return Err(ChainError::Corrupt {
                    index: index + 1,
                    reason: violation.to_string(),
                });
            }
        }
        Ok(())
    }
}
