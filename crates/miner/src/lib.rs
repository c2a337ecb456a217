//! Proof-of-work search for powbench.
//!
//! Two strategies behind one [`Miner`] trait:
//! - [`SequentialMiner`]: a single-threaded scan over increasing nonces
//! - [`ParallelMiner`]: a coordinator racing worker threads over disjoint
//!   residue classes of the nonce space, with a shared stop signal
//!
//! # Example
//!
//! ```rust,no_run
//! use powbench_core::{Address, BlockTemplate, Hash, Transaction};
//! use powbench_miner::{Miner, ParallelConfig, ParallelMiner};
//!
//! let tx = Transaction::transfer(Address::ZERO, Address::ZERO, 1.0).unwrap();
//! let template = BlockTemplate::now(Hash::ZERO, vec![tx]);
//!
//! let miner = ParallelMiner::new(ParallelConfig::with_workers(4)).unwrap();
//! let outcome = miner.mine(&template, 4).unwrap();
//! assert!(outcome.block.meets_difficulty(4));
//! ```

pub mod config;
pub mod miner;
pub mod parallel;
pub mod sequential;
pub mod worker;

// Re-export commonly used types
pub use config::{ConfigError, ParallelConfig, SequentialConfig};
pub use miner::{Miner, MiningError, MiningOutcome, Result, WorkerAttempts};
pub use parallel::ParallelMiner;
pub use sequential::SequentialMiner;
pub use worker::{StopSignal, WorkerOutcome, WorkerReport};
