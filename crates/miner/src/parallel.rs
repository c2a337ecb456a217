//! Multi-worker search coordinator.
//!
//! The coordinator spawns `workers` threads over disjoint residue classes,
//! waits for the first winning report, raises the stop signal and then drains
//! the remaining reports for statistics.
//!
//! The drain is best effort: a worker that does not report within
//! `drain_timeout` is left out of the totals. This undercounts attempts but
//! never affects which block wins.

use crate::config::{ConfigError, ParallelConfig};
use crate::miner::{Miner, MiningError, MiningOutcome, Result, WorkerAttempts};
use crate::worker::{StopSignal, Worker, WorkerOutcome, WorkerReport};
use powbench_core::{BlockTemplate, Hash};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Raises the stop signal when dropped, so no worker outlives a search.
struct StopOnDrop(StopSignal);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.raise();
    }
}

/// Per-worker counters collected from reports.
#[derive(Debug)]
struct Tally {
    attempts: Vec<Option<u64>>,
    elapsed: Vec<Duration>,
    reported: usize,
}

impl Tally {
    fn new(workers: usize) -> Self {
        Self {
            attempts: vec![None; workers],
            elapsed: vec![Duration::ZERO; workers],
            reported: 0,
        }
    }

    fn record(&mut self, report: &WorkerReport) {
        if let Some(slot) = self.attempts.get_mut(report.worker_id) {
            *slot = Some(slot.unwrap_or(0) + report.attempts);
            self.elapsed[report.worker_id] += report.elapsed;
            self.reported += 1;
        }
    }

    fn pending(&self) -> usize {
        self.attempts.len().saturating_sub(self.reported)
    }

    fn total(&self) -> u64 {
        self.attempts.iter().flatten().sum()
    }

    fn breakdown(&self) -> Vec<WorkerAttempts> {
        self.attempts
            .iter()
            .zip(&self.elapsed)
            .enumerate()
            .map(|(worker_id, (attempts, elapsed))| WorkerAttempts {
                worker_id,
                attempts: *attempts,
                elapsed: *elapsed,
            })
            .collect()
    }
}

/// Races a fixed number of worker threads for a winning nonce.
#[derive(Debug, Clone, Default)]
pub struct ParallelMiner {
    config: ParallelConfig,
}

impl ParallelMiner {
    pub fn new(config: ParallelConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Spawn the workers and coordinate them until a winner is chosen.
    pub fn search(&self, template: &BlockTemplate, difficulty: usize) -> Result<MiningOutcome> {
        let stop = StopSignal::new();
        let _guard = StopOnDrop(stop.clone());
        let shared = Arc::new(template.clone());
        let (report_tx, report_rx) = mpsc::channel();

        for id in 0..self.config.workers {
            let worker = Worker::new(
                id,
                difficulty,
                &self.config,
                Arc::clone(&shared),
                stop.clone(),
                report_tx.clone(),
            );
            thread::Builder::new()
                .name(format!("pow-worker-{id}"))
                .spawn(move || worker.run())?;
        }
        // Only workers hold senders now, so a disconnect means all have exited.
        drop(report_tx);

        self.collect(&shared, &report_rx, &stop)
    }

    /// Coordinate from already-running workers' reports.
    ///
    /// The first `Found` report received is authoritative. Any later `Found`
    /// report only contributes its attempt count.
    fn collect(
        &self,
        template: &BlockTemplate,
        reports: &Receiver<WorkerReport>,
        stop: &StopSignal,
    ) -> Result<MiningOutcome> {
        let workers = self.config.workers;
        let started = Instant::now();
        let mut tally = Tally::new(workers);

        let (winner, nonce, hash) = loop {
            let mut wait = self.config.poll_interval();
            if let Some(limit) = self.config.max_wait() {
                let remaining = limit.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    stop.raise();
                    // A report already in flight can still carry the first winner.
                    if let Some((winner, nonce, hash)) = self.drain(reports, &mut tally, true) {
                        info!(worker = winner, nonce, hash = %hash, "winning nonce found at the wait limit");
                        return Ok(Self::outcome(template, &tally, winner, nonce, hash));
                    }
                    warn!(
                        waited_ms = started.elapsed().as_millis() as u64,
                        "no winning nonce before the wait limit"
                    );
                    return Err(MiningError::Timeout {
                        waited: started.elapsed(),
                        tested: tally.total(),
                    });
                }
                wait = wait.min(remaining);
            }

            match reports.recv_timeout(wait) {
                Ok(report) => {
                    tally.record(&report);
                    if let WorkerOutcome::Found { nonce, hash } = report.outcome {
                        break (report.worker_id, nonce, hash);
                    }
                    if tally.pending() == 0 {
                        return Err(MiningError::Exhausted {
                            tested: tally.total(),
                        });
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(MiningError::WorkersLost {
                        reported: tally.reported,
                        workers,
                    });
                }
            }
        };

        stop.raise();
        info!(worker = winner, nonce, hash = %hash, "winning nonce found");

        self.drain(reports, &mut tally, false);

        Ok(Self::outcome(template, &tally, winner, nonce, hash))
    }

    fn outcome(
        template: &BlockTemplate,
        tally: &Tally,
        winner: usize,
        nonce: u64,
        hash: Hash,
    ) -> MiningOutcome {
        MiningOutcome {
            block: template.seal_reported(nonce, hash),
            nonces_tested: tally.total(),
            workers: tally.breakdown(),
            winner: Some(winner),
        }
    }

    /// Collect outstanding reports, giving each at most `drain_timeout`.
    ///
    /// With `claim_winner` set, the first `Found` report drained is returned
    /// as the winner. Otherwise, and for every later `Found`, the report only
    /// adds to the attempt counts.
    fn drain(
        &self,
        reports: &Receiver<WorkerReport>,
        tally: &mut Tally,
        claim_winner: bool,
    ) -> Option<(usize, u64, Hash)> {
        let mut winner = None;
        while tally.pending() > 0 {
            match reports.recv_timeout(self.config.drain_timeout()) {
                Ok(report) => {
                    tally.record(&report);
                    if let WorkerOutcome::Found { nonce, hash } = report.outcome {
                        if claim_winner && winner.is_none() {
                            winner = Some((report.worker_id, nonce, hash));
                        } else {
                            debug!(
                                worker = report.worker_id,
                                "late winning report counted for statistics only"
                            );
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        missing = tally.pending(),
                        "worker reports timed out; attempt totals are an undercount"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!(
                        missing = tally.pending(),
                        "workers exited without reporting"
                    );
                    break;
                }
            }
        }
        winner
    }
}

impl Miner for ParallelMiner {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn worker_count(&self) -> usize {
        self.config.workers
    }

    fn mine(&self, template: &BlockTemplate, difficulty: usize) -> Result<MiningOutcome> {
        self.search(template, difficulty)
    }
}
