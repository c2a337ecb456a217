//! Persistence layer for powbench.
//!
//! This crate writes and reads the files a mining run produces:
//! - Persisted chains (`{ "length": n, "blocks": [...] }`), checked on load
//! - Mining reports as JSON and CSV
//! - Scaling comparisons built from saved performance files
//!
//! # Example
//!
//! ```rust,no_run
//! use powbench_core::HashedBlock;
//! use powbench_storage::{ChainDocument, ChainStore, Storage};
//!
//! let storage = Storage::open("./output").unwrap();
//! let store = ChainStore::new(&storage);
//!
//! let doc = ChainDocument::new(vec![HashedBlock::genesis(1700000000.0)]);
//! store.put("chain.json", &doc).unwrap();
//! assert_eq!(store.get("chain.json").unwrap(), Some(doc));
//! ```

pub mod chain;
pub mod db;
pub mod reports;
pub mod scaling;

// Re-export commonly used types
pub use chain::{ChainDocument, ChainStore};
pub use db::{Result, Storage, StorageError};
pub use reports::{
    config_suffix, hash_rate, percentage, BlockRecord, MiningReport, PerformanceRecord,
    RunOutput, RunSummary, WorkerShareRecord, WorkerSummaryRecord,
};
pub use scaling::{RunKind, ScalingReport, ScalingRow};
