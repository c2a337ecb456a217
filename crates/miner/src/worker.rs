//! Search workers for the parallel coordinator.
//!
//! Each worker owns one residue class of the nonce space: worker `i` of `n`
//! tests `i, i + n, i + 2n, ...`. Workers never share mutable state beyond the
//! [`StopSignal`] and the report channel.

use crate::config::ParallelConfig;
use powbench_core::{BlockTemplate, Hash};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Shared early-stop flag. Monotonic: once raised it stays raised.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// How a worker's scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// The worker found a nonce meeting the difficulty.
    Found { nonce: u64, hash: Hash },
    /// Another worker raised the stop signal.
    Stopped,
    /// The worker ran out of nonces in its class.
    Exhausted,
}

/// Message sent from a worker to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: usize,
    /// Candidates this worker hashed, including the winning one.
    pub attempts: u64,
    /// Time spent scanning.
    pub elapsed: Duration,
    pub outcome: WorkerOutcome,
}

impl WorkerReport {
    pub fn is_found(&self) -> bool {
        matches!(self.outcome, WorkerOutcome::Found { .. })
    }
}

/// One search worker, moved onto its own thread.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    stride: u64,
    difficulty: usize,
    check_interval: u64,
    max_nonce: Option<u64>,
    template: Arc<BlockTemplate>,
    stop: StopSignal,
    reports: Sender<WorkerReport>,
}

impl Worker {
    /// Create worker `id` of `config.workers`.
    pub fn new(
        id: usize,
        difficulty: usize,
        config: &ParallelConfig,
        template: Arc<BlockTemplate>,
        stop: StopSignal,
        reports: Sender<WorkerReport>,
    ) -> Self {
        Self {
            id,
            stride: config.workers as u64,
            difficulty,
            check_interval: config.check_interval.max(1),
            max_nonce: config.max_nonce,
            template,
            stop,
            reports,
        }
    }

    /// Scan and send the final report. Blocking; run on a dedicated thread.
    pub fn run(self) {
        debug!(worker = self.id, stride = self.stride, "worker started");
        let report = self.scan();
        debug!(
            worker = self.id,
            attempts = report.attempts,
            outcome = ?report.outcome,
            "worker finished"
        );
        if self.reports.send(report).is_err() {
            trace!(worker = self.id, "coordinator no longer listening");
        }
    }

    /// Scan this worker's residue class until a match, a stop, or exhaustion.
    pub fn scan(&self) -> WorkerReport {
        let started = Instant::now();
        let mut nonce = self.id as u64;
        let mut attempts: u64 = 0;

        let outcome = loop {
            if matches!(self.max_nonce, Some(max) if nonce >= max) {
                break WorkerOutcome::Exhausted;
            }

            let hash = self.template.digest(nonce);
            attempts += 1;

            if hash.meets_difficulty(self.difficulty) {
                self.stop.raise();
                break WorkerOutcome::Found { nonce, hash };
            }

            if attempts % self.check_interval == 0 && self.stop.is_raised() {
                break WorkerOutcome::Stopped;
            }

            match nonce.checked_add(self.stride) {
                Some(next) => nonce = next,
                None => break WorkerOutcome::Exhausted,
            }
        };

        WorkerReport {
            worker_id: self.id,
            attempts,
            elapsed: started.elapsed(),
            outcome,
        }
    }
}
