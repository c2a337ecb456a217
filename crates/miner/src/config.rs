//! Search configuration.
//!
//! Both configs deserialize from JSON with every field optional, falling back
//! to the defaults below.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors for invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// Single-threaded search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequentialConfig {
    /// First nonce tested.
    pub start_nonce: u64,
    /// Exclusive upper bound on nonces; `None` searches until overflow.
    pub max_nonce: Option<u64>,
    /// Attempts between progress callbacks.
    pub progress_interval: u64,
}

impl Default for SequentialConfig {
    fn default() -> Self {
        Self {
            start_nonce: 0,
            max_nonce: None,
            progress_interval: 100_000,
        }
    }
}

impl SequentialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_interval == 0 {
            return Err(ConfigError::Zero("progress_interval"));
        }
        Ok(())
    }
}

/// Default bound on the wait for a winning nonce: ten minutes.
pub const DEFAULT_MAX_WAIT_MS: u64 = 600_000;

/// Multi-worker search settings.
///
/// Both wait phases are bounded. `max_wait_ms` limits the wait for a winner
/// and ends the search with a timeout. `drain_timeout_ms` limits each
/// statistics report after the winner; exceeding it only undercounts
/// attempts and never changes the winning block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Attempts between stop-signal checks in each worker.
    pub check_interval: u64,
    /// Exclusive upper bound on nonces, shared by all workers.
    pub max_nonce: Option<u64>,
    /// Receive timeout while waiting for a winner, in milliseconds.
    pub poll_interval_ms: u64,
    /// Per-report timeout when collecting statistics after a winner, in milliseconds.
    pub drain_timeout_ms: u64,
    /// Upper bound on the whole wait for a winner, in milliseconds.
    /// `null` in a settings file removes the bound.
    pub max_wait_ms: Option<u64>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            check_interval: 10_000,
            max_nonce: None,
            poll_interval_ms: 100,
            drain_timeout_ms: 1_000,
            max_wait_ms: Some(DEFAULT_MAX_WAIT_MS),
        }
    }
}

impl ParallelConfig {
    /// Default settings with the given worker count.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        if self.check_interval == 0 {
            return Err(ConfigError::Zero("check_interval"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll_interval_ms"));
        }
        if self.drain_timeout_ms == 0 {
            return Err(ConfigError::Zero("drain_timeout_ms"));
        }
        if self.max_wait_ms == Some(0) {
            return Err(ConfigError::Zero("max_wait_ms"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Exceeding this only loses late worker statistics, never the winner.
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }
}
