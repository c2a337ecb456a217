//! Chain validation and the mining loop for powbench.
//!
//! This crate ties the pieces together:
//! - **Chain**: append-only block list gated by the validation rules
//! - **TransactionSource**: fixed or random transaction batches
//! - **MiningSession**: mines blocks onto a chain and records telemetry
//!
//! # Example
//!
//! ```rust,no_run
//! use powbench_chain::{Chain, MiningSession, RandomTransactions, SessionConfig};
//! use powbench_miner::SequentialMiner;
//!
//! let miner = SequentialMiner::default();
//! let session = MiningSession::new(SessionConfig::default(), &miner).unwrap();
//!
//! let mut chain = Chain::new();
//! let report = session
//!     .run(&mut chain, &mut RandomTransactions::seeded(42))
//!     .unwrap();
//! assert_eq!(chain.len(), report.blocks.len() + 1);
//! ```

pub mod blockchain;
pub mod session;
pub mod source;

// Re-export commonly used types
pub use blockchain::{Chain, ChainError, Result, ValidationError};
pub use session::{MiningSession, SessionConfig, SessionError, SessionReport};
pub use source::{FixedTransactions, RandomTransactions, TransactionSource};
