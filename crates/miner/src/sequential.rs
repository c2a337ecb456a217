//! Single-threaded brute-force search.

use crate::config::{ConfigError, SequentialConfig};
use crate::miner::{Miner, MiningError, MiningOutcome, Result};
use powbench_core::{BlockTemplate, Hash};
use std::time::Instant;
use tracing::{debug, info};

/// Scans nonces upward from `start_nonce` until a digest meets the difficulty.
#[derive(Debug, Clone, Default)]
pub struct SequentialMiner {
    config: SequentialConfig,
}

impl SequentialMiner {
    pub fn new(config: SequentialConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SequentialConfig {
        &self.config
    }

    /// Run the search, calling `on_progress(nonce, digest)` every
    /// `progress_interval` attempts.
    ///
    /// The returned nonce is the smallest one at or above `start_nonce`
    /// that satisfies the difficulty. The callback cannot influence the scan.
    pub fn search<F>(
        &self,
        template: &BlockTemplate,
        difficulty: usize,
        mut on_progress: F,
    ) -> Result<MiningOutcome>
    where
        F: FnMut(u64, &Hash),
    {
        let mut nonce = self.config.start_nonce;
        let mut tested: u64 = 0;

        loop {
            if matches!(self.config.max_nonce, Some(max) if nonce >= max) {
                return Err(MiningError::Exhausted { tested });
            }

            let hash = template.digest(nonce);
            tested += 1;

            if tested % self.config.progress_interval == 0 {
                on_progress(nonce, &hash);
            }

            if hash.meets_difficulty(difficulty) {
                return Ok(MiningOutcome {
                    block: template.seal_reported(nonce, hash),
                    nonces_tested: tested,
                    workers: Vec::new(),
                    winner: None,
                });
            }

            nonce = nonce
                .checked_add(1)
                .ok_or(MiningError::Exhausted { tested })?;
        }
    }
}

impl Miner for SequentialMiner {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn worker_count(&self) -> usize {
        1
    }

    fn mine(&self, template: &BlockTemplate, difficulty: usize) -> Result<MiningOutcome> {
        let started = Instant::now();
        let start_nonce = self.config.start_nonce;

        let outcome = self.search(template, difficulty, |nonce, hash| {
            let tested = nonce - start_nonce + 1;
            let elapsed = started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 { tested as f64 / elapsed } else { 0.0 };
            info!(tested, hash_rate = rate as u64, hash = %hash, "search progress");
        })?;

        debug!(
            nonce = outcome.block.nonce,
            tested = outcome.nonces_tested,
            "sequential search finished"
        );
        Ok(outcome)
    }
}
