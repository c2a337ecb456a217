//! Strong scaling comparison across saved runs.
//!
//! Reads every `pow_performance_{mode}_{suffix}.csv` in a directory, groups
//! the per-block times by run kind, and reports each group's mean time and
//! speedup over the sequential baseline. Speedup spread is the relative
//! standard deviation of the group's times scaled onto the speedup.

use crate::db::{read_csv, Result, Storage};
use crate::reports::PerformanceRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

const PERFORMANCE_PREFIX: &str = "pow_performance_";

/// How a group of runs searched for nonces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunKind {
    Sequential,
    Parallel { workers: usize },
}

impl RunKind {
    pub fn workers(&self) -> usize {
        match self {
            RunKind::Sequential => 1,
            RunKind::Parallel { workers } => *workers,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            RunKind::Sequential => "sequential",
            RunKind::Parallel { .. } => "parallel",
        }
    }
}

/// Run kind and difficulty encoded in a performance file name.
///
/// `pow_performance_parallel_d4_b5_t5_w8.csv` is parallel with 8 workers at
/// difficulty 4. Parallel names without a worker count are not recognised.
pub fn parse_performance_name(name: &str) -> Option<(RunKind, usize)> {
    let stem = name.strip_prefix(PERFORMANCE_PREFIX)?.strip_suffix(".csv")?;
    let mut parts = stem.split('_');
    let mode = parts.next()?;

    let mut difficulty = None;
    let mut workers = None;
    for part in parts {
        if let Some(value) = part.strip_prefix('d') {
            difficulty = value.parse().ok();
        } else if let Some(value) = part.strip_prefix('w') {
            workers = value.parse().ok();
        }
    }

    let kind = match mode {
        "sequential" => RunKind::Sequential,
        "parallel" => RunKind::Parallel { workers: workers? },
        _ => return None,
    };
    Some((kind, difficulty?))
}

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation, 0 for fewer than two values.
pub fn std_dev(data: &[f64], mean: f64) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    variance.sqrt()
}

/// Aggregated timings for one run kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingRow {
    pub mode: String,
    pub workers: usize,
    pub samples: usize,
    pub mean_time: f64,
    pub std_dev: f64,
    pub speedup: f64,
    pub speedup_std_dev: f64,
    pub efficiency: f64,
}

/// Per-kind block times and the speedups derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingReport {
    /// Difficulty the samples were restricted to, `None` for all.
    pub difficulty: Option<usize>,
    /// Kind whose mean time every speedup is relative to.
    pub baseline: Option<RunKind>,
    pub rows: Vec<ScalingRow>,
}

impl ScalingReport {
    /// Build a report from per-block times grouped by run kind.
    ///
    /// The sequential group is the baseline. Without one, the parallel group
    /// with the fewest workers takes its place.
    pub fn from_samples(difficulty: Option<usize>, samples: &BTreeMap<RunKind, Vec<f64>>) -> Self {
        let samples: BTreeMap<_, _> = samples.iter().filter(|(_, t)| !t.is_empty()).collect();
        let baseline = samples.keys().next().map(|kind| **kind);
        let base_mean = samples.values().next().map_or(0.0, |times| mean(times));

        let rows = samples
            .into_iter()
            .map(|(kind, times)| {
                let mean_time = mean(times);
                let spread = std_dev(times, mean_time);
                let speedup = if mean_time > 0.0 { base_mean / mean_time } else { 0.0 };
                let speedup_std_dev = if mean_time > 0.0 {
                    spread / mean_time * speedup
                } else {
                    0.0
                };
                ScalingRow {
                    mode: kind.mode().to_string(),
                    workers: kind.workers(),
                    samples: times.len(),
                    mean_time,
                    std_dev: spread,
                    speedup,
                    speedup_std_dev,
                    efficiency: speedup / kind.workers() as f64,
                }
            })
            .collect();

        Self {
            difficulty,
            baseline,
            rows,
        }
    }

    /// Collect every performance file in `storage`, optionally only those
    /// mined at `difficulty`.
    pub fn load(storage: &Storage, difficulty: Option<usize>) -> Result<Self> {
        let mut samples: BTreeMap<RunKind, Vec<f64>> = BTreeMap::new();

        for path in storage.files_with_prefix(PERFORMANCE_PREFIX)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((kind, file_difficulty)) = parse_performance_name(name) else {
                debug!(file = name, "skipping unrecognised performance file");
                continue;
            };
            if difficulty.is_some_and(|d| d != file_difficulty) {
                continue;
            }

            let records: Vec<PerformanceRecord> = read_csv(&path)?;
            debug!(file = name, rows = records.len(), "performance file read");
            samples
                .entry(kind)
                .or_default()
                .extend(records.iter().map(|r| r.time_seconds));
        }

        let report = Self::from_samples(difficulty, &samples);
        info!(groups = report.rows.len(), "scaling report built");
        Ok(report)
    }

    /// File name for the exported table.
    pub fn file_name(&self) -> String {
        match self.difficulty {
            Some(d) => format!("pow_scaling_d{d}.csv"),
            None => "pow_scaling_all.csv".to_string(),
        }
    }

    /// Write the table as CSV; nothing is written for an empty report.
    pub fn save(&self, storage: &Storage) -> Result<Option<PathBuf>> {
        storage.put_csv(&self.file_name(), &self.rows)
    }
}
