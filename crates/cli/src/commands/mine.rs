//! Mine a chain and export the run's records.

use crate::display;
use crate::settings::Settings;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use powbench_chain::{Chain, MiningSession, RandomTransactions};
use powbench_miner::{Miner, ParallelMiner, SequentialMiner};
use powbench_storage::{config_suffix, Storage};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Sequential,
    Parallel,
}

#[derive(Debug, Args)]
pub struct MineArgs {
    /// Search strategy
    #[arg(long, value_enum, default_value = "sequential")]
    mode: Mode,

    /// Leading hex zeros required (default: 4)
    #[arg(short, long)]
    difficulty: Option<usize>,

    /// Number of blocks to mine (default: 5)
    #[arg(short = 'n', long)]
    blocks: Option<usize>,

    /// Transactions per block (default: 5)
    #[arg(short = 't', long)]
    txs_per_block: Option<usize>,

    /// Worker threads in parallel mode (default: 4)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed for the transaction generator
    #[arg(long)]
    seed: Option<u64>,

    /// Exclusive upper bound on nonces
    #[arg(long)]
    max_nonce: Option<u64>,

    /// Give up on a block after this many milliseconds (parallel mode)
    #[arg(long)]
    max_wait_ms: Option<u64>,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for result files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Do not write result files
    #[arg(long)]
    no_save: bool,
}

impl MineArgs {
    /// Layer command-line values over `settings`.
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(difficulty) = self.difficulty {
            settings.session.difficulty = difficulty;
        }
        if let Some(blocks) = self.blocks {
            settings.session.blocks = blocks;
        }
        if let Some(txs) = self.txs_per_block {
            settings.session.txs_per_block = txs;
        }
        if let Some(workers) = self.workers {
            settings.parallel.workers = workers;
        }
        if let Some(max_nonce) = self.max_nonce {
            settings.sequential.max_nonce = Some(max_nonce);
            settings.parallel.max_nonce = Some(max_nonce);
        }
        if let Some(ms) = self.max_wait_ms {
            settings.parallel.max_wait_ms = Some(ms);
        }
    }

    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        self.apply_to(&mut settings);
        settings.validate()?;
        Ok(settings)
    }
}

pub fn run(args: MineArgs) -> Result<()> {
    let settings = args.settings()?;

    let miner: Box<dyn Miner> = match args.mode {
        Mode::Sequential => Box::new(SequentialMiner::new(settings.sequential.clone())?),
        Mode::Parallel => Box::new(ParallelMiner::new(settings.parallel.clone())?),
    };
    let session = MiningSession::new(settings.session.clone(), &*miner)?;
    let config = session.config();

    display::print_header(
        miner.name(),
        config.difficulty,
        config.blocks,
        config.txs_per_block,
        miner.worker_count(),
    );

    let mut chain = Chain::new();
    let mut source = match args.seed {
        Some(seed) => RandomTransactions::seeded(seed),
        None => RandomTransactions::new(),
    };

    let report = session
        .run_with(&mut chain, &mut source, display::print_block)
        .context("Mining failed")?;
    display::print_summary(&report);
    display::print_worker_summary(&report.worker_summary);

    if args.no_save {
        return Ok(());
    }

    let workers = match args.mode {
        Mode::Sequential => None,
        Mode::Parallel => Some(miner.worker_count()),
    };
    let suffix = config_suffix(
        config.difficulty,
        config.blocks,
        config.txs_per_block,
        workers,
    );
    let storage = Storage::open(&args.output_dir).with_context(|| {
        format!("Failed to open output directory: {}", args.output_dir.display())
    })?;
    let written = session
        .output(report)
        .save(&storage, &suffix, &chain.to_document())
        .context("Failed to save results")?;

    println!("{}  Results saved", "✓".green().bold());
    for path in written {
        println!("  {}", path.display().to_string().bright_black());
    }
    println!();

    Ok(())
}
