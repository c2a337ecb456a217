//! The mining loop.
//!
//! For each block the session takes the chain tip and a transaction batch,
//! builds a template, runs the configured [`Miner`] and appends the result.
//! A failed search or a rejected block is retried with a fresh template up to
//! `max_retries` times before the session halts.

use crate::blockchain::{Chain, ValidationError};
use crate::source::TransactionSource;
use powbench_core::BlockTemplate;
use powbench_miner::{ConfigError, Miner, MiningError};
use powbench_storage::{
    hash_rate, percentage, BlockRecord, MiningReport, PerformanceRecord, RunOutput, RunSummary,
    WorkerShareRecord, WorkerSummaryRecord,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that stop a mining session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session config: {0}")]
    Config(#[from] ConfigError),

    #[error("block {block} could not be mined: {source}")]
    Mining {
        block: usize,
        #[source]
        source: MiningError,
    },

    #[error("block {block} was rejected: {source}")]
    Rejected {
        block: usize,
        #[source]
        source: ValidationError,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Parameters of a mining run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Leading hex zeros required of every block hash.
    pub difficulty: usize,
    /// Number of blocks to mine after genesis.
    pub blocks: usize,
    pub txs_per_block: usize,
    /// Extra attempts per block after a failed search or rejected block.
    pub max_retries: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: 4,
            blocks: 5,
            txs_per_block: 5,
            max_retries: 2,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.difficulty == 0 {
            return Err(ConfigError::Zero("difficulty"));
        }
        if self.blocks == 0 {
            return Err(ConfigError::Zero("blocks"));
        }
        if self.txs_per_block == 0 {
            return Err(ConfigError::Zero("txs_per_block"));
        }
        Ok(())
    }
}

/// Telemetry gathered over a session.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub blocks: Vec<BlockRecord>,
    pub performance: Vec<PerformanceRecord>,
    pub worker_shares: Vec<WorkerShareRecord>,
    /// Per-worker totals indexed by worker id, empty for sequential runs.
    pub worker_summary: Vec<WorkerSummaryRecord>,
    pub total_time: f64,
    pub total_nonces_tested: u64,
}

impl SessionReport {
    /// Worker shares recorded for one block.
    pub fn shares_for(&self, block_number: usize) -> impl Iterator<Item = &WorkerShareRecord> {
        self.worker_shares
            .iter()
            .filter(move |share| share.block_number == block_number)
    }

    pub fn average_hash_rate(&self) -> f64 {
        hash_rate(self.total_nonces_tested, self.total_time)
    }

    fn worker_entry(&mut self, worker_id: usize) -> &mut WorkerSummaryRecord {
        let known = self.worker_summary.len();
        if worker_id >= known {
            self.worker_summary
                .extend((known..=worker_id).map(WorkerSummaryRecord::new));
        }
        &mut self.worker_summary[worker_id]
    }
}

/// Drives a [`Miner`] over a [`Chain`].
pub struct MiningSession<'a> {
    config: SessionConfig,
    miner: &'a dyn Miner,
}

impl<'a> MiningSession<'a> {
    pub fn new(config: SessionConfig, miner: &'a dyn Miner) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, miner })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mine every configured block onto `chain`.
    pub fn run(&self, chain: &mut Chain, source: &mut dyn TransactionSource) -> Result<SessionReport> {
        self.run_with(chain, source, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_block` after each append with the
    /// block's record and its worker shares.
    pub fn run_with<F>(
        &self,
        chain: &mut Chain,
        source: &mut dyn TransactionSource,
        mut on_block: F,
    ) -> Result<SessionReport>
    where
        F: FnMut(&BlockRecord, &[WorkerShareRecord]),
    {
        let difficulty = self.config.difficulty;
        let mut report = SessionReport::default();

        info!(
            miner = self.miner.name(),
            workers = self.miner.worker_count(),
            difficulty,
            blocks = self.config.blocks,
            "mining session started"
        );

        for block_number in 1..=self.config.blocks {
            let transactions = source.next_batch(self.config.txs_per_block);
            let started = Instant::now();
            let mut tested: u64 = 0;
            let mut attempt = 0;

            let outcome = loop {
                let template = BlockTemplate::now(chain.tip_hash(), transactions.clone());
                let failure = match self.miner.mine(&template, difficulty) {
                    Ok(outcome) => {
                        tested += outcome.nonces_tested;
                        match chain.append(outcome.block.clone(), difficulty) {
                            Ok(()) => break outcome,
                            Err(err) => SessionError::Rejected {
                                block: block_number,
                                source: err,
                            },
                        }
                    }
                    Err(err) => {
                        tested += tested_before_failure(&err);
                        SessionError::Mining {
                            block: block_number,
                            source: err,
                        }
                    }
                };

                if attempt >= self.config.max_retries {
                    return Err(failure);
                }
                attempt += 1;
                warn!(block = block_number, attempt, error = %failure, "retrying block");
            };

            let elapsed = started.elapsed().as_secs_f64();
            report.total_time += elapsed;
            report.total_nonces_tested += tested;

            let record = BlockRecord {
                block_number,
                nonce: outcome.block.nonce,
                nonces_tested: tested,
                elapsed_time: elapsed,
                cumulative_time: report.total_time,
                hash_rate: hash_rate(tested, elapsed),
                hash: outcome.block.hash.to_hex(),
                num_transactions: outcome.block.tx_count(),
            };
            report.performance.push(PerformanceRecord {
                block_number,
                difficulty,
                num_workers: self.miner.worker_count(),
                nonces_tested: tested,
                time_seconds: elapsed,
                hash_rate: record.hash_rate,
                timestamp: outcome.block.timestamp,
                num_transactions: record.num_transactions,
            });

            if let Some(winner) = outcome.winner {
                report.worker_entry(winner).blocks_found += 1;
            }
            let first_share = report.worker_shares.len();
            for worker in &outcome.workers {
                let Some(attempts) = worker.attempts else {
                    debug!(block = block_number, worker = worker.worker_id, "no stats from worker");
                    continue;
                };
                let entry = report.worker_entry(worker.worker_id);
                entry.total_attempts += attempts;
                entry.total_time_seconds += worker.elapsed.as_secs_f64();

                report.worker_shares.push(WorkerShareRecord {
                    block_number,
                    worker_id: worker.worker_id,
                    nonces_tested: attempts,
                    percentage: percentage(attempts, tested),
                });
            }

            on_block(&record, &report.worker_shares[first_share..]);
            report.blocks.push(record);
        }

        info!(
            blocks = report.blocks.len(),
            total_nonces = report.total_nonces_tested,
            total_time = report.total_time,
            "mining session finished"
        );
        Ok(report)
    }

    /// Package a finished report for export.
    pub fn output(&self, report: SessionReport) -> RunOutput {
        let metadata = RunSummary {
            mode: self.miner.name().to_string(),
            difficulty: self.config.difficulty,
            num_workers: self.miner.worker_count(),
            blocks_mined: report.blocks.len(),
            txs_per_block: self.config.txs_per_block,
            total_time: report.total_time,
            total_nonces_tested: report.total_nonces_tested,
            average_hash_rate: report.average_hash_rate(),
        };
        RunOutput {
            report: MiningReport {
                metadata,
                blocks: report.blocks,
            },
            performance: report.performance,
            worker_shares: report.worker_shares,
            worker_summary: report.worker_summary,
        }
    }
}

fn tested_before_failure(err: &MiningError) -> u64 {
    match err {
        MiningError::Exhausted { tested } | MiningError::Timeout { tested, .. } => *tested,
        MiningError::WorkersLost { .. } | MiningError::Spawn(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FixedTransactions, RandomTransactions};
    use powbench_core::{Address, Hash, HashedBlock, Transaction};
    use powbench_miner::{MiningOutcome, SequentialConfig, SequentialMiner, WorkerAttempts};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn small_config() -> SessionConfig {
        SessionConfig {
            difficulty: 1,
            blocks: 3,
            txs_per_block: 2,
            max_retries: 1,
        }
    }

    /// Returns blocks pointing at the wrong parent.
    struct DetachedMiner {
        calls: AtomicUsize,
    }

    impl Miner for DetachedMiner {
        fn name(&self) -> &'static str {
            "detached"
        }

        fn worker_count(&self) -> usize {
            1
        }

        fn mine(
            &self,
            template: &BlockTemplate,
            _difficulty: usize,
        ) -> powbench_miner::Result<MiningOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let block = HashedBlock::new(
                Hash::from_bytes([9; 32]),
                template.transactions().to_vec(),
                template.timestamp(),
                0,
            );
            Ok(MiningOutcome {
                block,
                nonces_tested: 1,
                workers: Vec::new(),
                winner: None,
            })
        }
    }

    /// Times out once, then reports a fixed two-worker win.
    struct RetryingMiner {
        calls: AtomicUsize,
    }

    impl Miner for RetryingMiner {
        fn name(&self) -> &'static str {
            "retrying"
        }

        fn worker_count(&self) -> usize {
            2
        }

        fn mine(
            &self,
            template: &BlockTemplate,
            _difficulty: usize,
        ) -> powbench_miner::Result<MiningOutcome> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(MiningError::Timeout {
                    waited: Duration::from_millis(5),
                    tested: 100,
                });
            }
            let block = (0u64..)
                .map(|nonce| template.seal(nonce))
                .find(|block| block.meets_difficulty(1))
                .unwrap();
            Ok(MiningOutcome {
                block,
                nonces_tested: 100,
                workers: vec![
                    WorkerAttempts {
                        worker_id: 0,
                        attempts: Some(60),
                        elapsed: Duration::from_millis(250),
                    },
                    WorkerAttempts {
                        worker_id: 1,
                        attempts: Some(40),
                        elapsed: Duration::from_millis(250),
                    },
                ],
                winner: Some(0),
            })
        }
    }

    #[test]
    fn test_worker_shares_match_block_totals_after_retry() {
        let miner = RetryingMiner {
            calls: AtomicUsize::new(0),
        };
        let config = SessionConfig {
            blocks: 2,
            ..small_config()
        };
        let session = MiningSession::new(config, &miner).unwrap();
        let mut chain = Chain::new();

        let report = session
            .run(&mut chain, &mut RandomTransactions::seeded(5))
            .unwrap();

        let first = &report.blocks[0];
        assert_eq!(first.nonces_tested, 200);
        let shares: Vec<_> = report.shares_for(1).collect();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].percentage, 30.0);
        assert_eq!(shares[1].percentage, 20.0);
        for share in &shares {
            assert_eq!(share.percentage, percentage(share.nonces_tested, first.nonces_tested));
        }

        // Mined on the first try: shares cover the whole block.
        assert_eq!(report.blocks[1].nonces_tested, 100);
        let total: f64 = report.shares_for(2).map(|share| share.percentage).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn test_worker_summary_accumulates_over_run() {
        let miner = RetryingMiner {
            calls: AtomicUsize::new(0),
        };
        let config = SessionConfig {
            blocks: 2,
            ..small_config()
        };
        let session = MiningSession::new(config, &miner).unwrap();
        let mut chain = Chain::new();
        let report = session
            .run(&mut chain, &mut RandomTransactions::seeded(6))
            .unwrap();

        assert_eq!(
            report.worker_summary,
            vec![
                WorkerSummaryRecord {
                    worker_id: 0,
                    blocks_found: 2,
                    total_attempts: 120,
                    total_time_seconds: 0.5,
                },
                WorkerSummaryRecord {
                    worker_id: 1,
                    blocks_found: 0,
                    total_attempts: 80,
                    total_time_seconds: 0.5,
                },
            ]
        );

        let output = session.output(report);
        assert_eq!(output.worker_summary.len(), 2);
    }

    #[test]
    fn test_config_validation() {
        assert!(SessionConfig::default().validate().is_ok());
        for (config, field) in [
            (SessionConfig { difficulty: 0, ..SessionConfig::default() }, "difficulty"),
            (SessionConfig { blocks: 0, ..SessionConfig::default() }, "blocks"),
            (SessionConfig { txs_per_block: 0, ..SessionConfig::default() }, "txs_per_block"),
        ] {
            assert_eq!(config.validate(), Err(ConfigError::Zero(field)));
        }
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: SessionConfig = serde_json::from_str(r#"{"blocks": 9}"#).unwrap();
        assert_eq!(config.blocks, 9);
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.txs_per_block, 5);
    }

    #[test]
    fn test_sequential_session() {
        let miner = SequentialMiner::default();
        let session = MiningSession::new(small_config(), &miner).unwrap();
        let mut chain = Chain::new();
        let mut source = RandomTransactions::seeded(1);

        let mut seen = Vec::new();
        let report = session
            .run_with(&mut chain, &mut source, |record, shares| {
                assert!(shares.is_empty());
                seen.push(record.block_number);
            })
            .unwrap();

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(chain.len(), 4);
        chain.verify(1).unwrap();
        assert_eq!(report.blocks.len(), 3);
        assert_eq!(report.performance.len(), 3);
        assert!(report.worker_shares.is_empty());
        assert!(report.worker_summary.is_empty());

        for (record, block) in report.blocks.iter().zip(&chain.blocks()[1..]) {
            assert_eq!(record.nonce, block.nonce);
            assert_eq!(record.hash, block.hash.to_hex());
            assert_eq!(record.num_transactions, 2);
            assert!(record.nonces_tested > block.nonce);
        }
        let summed: u64 = report.blocks.iter().map(|r| r.nonces_tested).sum();
        assert_eq!(summed, report.total_nonces_tested);
    }

    #[test]
    fn test_output_summary() {
        let miner = SequentialMiner::default();
        let session = MiningSession::new(small_config(), &miner).unwrap();
        let mut chain = Chain::new();
        let report = session
            .run(&mut chain, &mut RandomTransactions::seeded(2))
            .unwrap();

        let output = session.output(report);
        let summary = &output.report.metadata;
        assert_eq!(summary.mode, "sequential");
        assert_eq!(summary.num_workers, 1);
        assert_eq!(summary.blocks_mined, 3);
        assert_eq!(summary.txs_per_block, 2);
        assert_eq!(output.report.blocks.len(), 3);
    }

    #[test]
    fn test_exhausted_search_halts_after_retries() {
        let miner = SequentialMiner::new(SequentialConfig {
            max_nonce: Some(10),
            ..SequentialConfig::default()
        })
        .unwrap();
        let config = SessionConfig {
            difficulty: 64,
            ..small_config()
        };
        let session = MiningSession::new(config, &miner).unwrap();
        let mut chain = Chain::new();

        let err = session
            .run(&mut chain, &mut RandomTransactions::seeded(3))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Mining {
                block: 1,
                source: MiningError::Exhausted { tested: 10 }
            }
        ));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_rejected_block_is_retried_then_fatal() {
        let miner = DetachedMiner {
            calls: AtomicUsize::new(0),
        };
        let session = MiningSession::new(small_config(), &miner).unwrap();
        let mut chain = Chain::new();
        let a = Address::from_bytes([1; 32]);
        let tx = Transaction::new(a, a, 1.0, 0.0).unwrap();

        let err = session
            .run(&mut chain, &mut FixedTransactions::new(vec![tx]))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Rejected {
                block: 1,
                source: ValidationError::Linkage { .. }
            }
        ));
        assert_eq!(miner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_empty_batches_are_rejected() {
        let miner = SequentialMiner::default();
        let config = SessionConfig {
            max_retries: 0,
            ..small_config()
        };
        let session = MiningSession::new(config, &miner).unwrap();
        let mut chain = Chain::new();

        let err = session
            .run(&mut chain, &mut FixedTransactions::new(Vec::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Rejected {
                source: ValidationError::EmptyBlock,
                ..
            }
        ));
    }
}
