//! The search strategy seam shared by the sequential and parallel miners.

use powbench_core::{BlockTemplate, HashedBlock};
use std::time::Duration;
use thiserror::Error;

/// Errors that end a search without a winning block.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("nonce range exhausted after {tested} candidates")]
    Exhausted { tested: u64 },

    #[error("no winning nonce within {waited:?} ({tested} candidates reported)")]
    Timeout { waited: Duration, tested: u64 },

    #[error("workers exited without a winner ({reported} of {workers} reported)")]
    WorkersLost { reported: usize, workers: usize },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MiningError>;

/// Attempts counted for one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerAttempts {
    pub worker_id: usize,
    /// `None` when the worker did not report before the drain timed out.
    pub attempts: Option<u64>,
    /// Time the worker spent scanning, zero when it did not report.
    pub elapsed: Duration,
}

/// A successful search.
#[derive(Debug, Clone)]
pub struct MiningOutcome {
    /// The winning block. Its hash is whatever the finder reported.
    pub block: HashedBlock,
    /// Candidates tested across every worker that reported.
    pub nonces_tested: u64,
    /// Per-worker breakdown, empty for single-threaded searches.
    pub workers: Vec<WorkerAttempts>,
    /// Worker that found the block, if the search was parallel.
    pub winner: Option<usize>,
}

impl MiningOutcome {
    /// Number of workers whose statistics were lost to the drain timeout.
    pub fn missing_reports(&self) -> usize {
        self.workers.iter().filter(|w| w.attempts.is_none()).count()
    }
}

/// A proof-of-work search strategy.
pub trait Miner: Send + Sync {
    /// Short label used in logs and output file names.
    fn name(&self) -> &'static str;

    /// Number of concurrent workers the strategy uses.
    fn worker_count(&self) -> usize;

    /// Find a nonce whose block digest has `difficulty` leading hex zeros.
    fn mine(&self, template: &BlockTemplate, difficulty: usize) -> Result<MiningOutcome>;
}
