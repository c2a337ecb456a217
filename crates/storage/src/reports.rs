//! Mining run records and the files they are exported to.

use crate::chain::ChainDocument;
use crate::db::{Result, Storage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Progress entry for one mined block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub block_number: usize,
    pub nonce: u64,
    pub nonces_tested: u64,
    pub elapsed_time: f64,
    pub cumulative_time: f64,
    pub hash_rate: f64,
    pub hash: String,
    pub num_transactions: usize,
}

/// Performance row for one mined block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub block_number: usize,
    pub difficulty: usize,
    pub num_workers: usize,
    pub nonces_tested: u64,
    pub time_seconds: f64,
    pub hash_rate: f64,
    pub timestamp: f64,
    pub num_transactions: usize,
}

/// One worker's share of the attempts spent on a block.
///
/// `percentage` is relative to the block's `nonces_tested`, which includes
/// any failed attempts before the successful search. Shares of a block only
/// sum to 100 when it was mined on the first attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerShareRecord {
    pub block_number: usize,
    pub worker_id: usize,
    pub nonces_tested: u64,
    pub percentage: f64,
}

/// One worker's totals over a whole run.
///
/// Only the successful search of each block contributes; attempts spent in
/// failed retries have no per-worker breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSummaryRecord {
    pub worker_id: usize,
    pub blocks_found: usize,
    pub total_attempts: u64,
    pub total_time_seconds: f64,
}

impl WorkerSummaryRecord {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            blocks_found: 0,
            total_attempts: 0,
            total_time_seconds: 0.0,
        }
    }

    pub fn hash_rate(&self) -> f64 {
        hash_rate(self.total_attempts, self.total_time_seconds)
    }
}

/// Totals for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: String,
    pub difficulty: usize,
    pub num_workers: usize,
    pub blocks_mined: usize,
    pub txs_per_block: usize,
    pub total_time: f64,
    pub total_nonces_tested: u64,
    pub average_hash_rate: f64,
}

/// The `pow_mining_*` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningReport {
    pub metadata: RunSummary,
    pub blocks: Vec<BlockRecord>,
}

/// Attempts per second, 0 when no time was measured.
pub fn hash_rate(nonces: u64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        nonces as f64 / seconds
    } else {
        0.0
    }
}

/// Share of `part` in `total` as a percentage, 0 for an empty total.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// File name suffix describing a run's parameters.
pub fn config_suffix(
    difficulty: usize,
    blocks: usize,
    txs_per_block: usize,
    workers: Option<usize>,
) -> String {
    let mut suffix = format!("d{difficulty}_b{blocks}_t{txs_per_block}");
    if let Some(workers) = workers {
        suffix.push_str(&format!("_w{workers}"));
    }
    suffix
}

/// Everything exported after a run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: MiningReport,
    pub performance: Vec<PerformanceRecord>,
    pub worker_shares: Vec<WorkerShareRecord>,
    pub worker_summary: Vec<WorkerSummaryRecord>,
}

impl RunOutput {
    /// Write the run files and the chain into `storage`.
    ///
    /// The load balancing and worker performance CSVs are only written for
    /// runs with per-worker data.
    pub fn save(
        &self,
        storage: &Storage,
        suffix: &str,
        chain: &ChainDocument,
    ) -> Result<Vec<PathBuf>> {
        let mode = &self.report.metadata.mode;
        let mut written = vec![
            storage.put_json(&format!("pow_mining_{mode}_{suffix}.json"), &self.report)?,
            storage.put_json(&format!("pow_blockchain_{mode}_{suffix}.json"), chain)?,
        ];
        written.extend(
            storage.put_csv(&format!("pow_performance_{mode}_{suffix}.csv"), &self.performance)?,
        );
        written.extend(storage.put_csv(
            &format!("pow_load_balancing_stats_{suffix}.csv"),
            &self.worker_shares,
        )?);
        written.extend(storage.put_csv(
            &format!("pow_worker_performance_{suffix}.csv"),
            &self.worker_summary,
        )?);

        info!(dir = %storage.dir().display(), files = written.len(), "results saved");
        Ok(written)
    }
}
