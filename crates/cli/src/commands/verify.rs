//! Verify a saved chain file.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powbench_chain::Chain;
use std::path::PathBuf;

#[derive(Args)]
pub struct VerifyArgs {
    /// Chain file written by `powbench mine`
    file: PathBuf,

    /// Also require every block to meet this difficulty
    #[arg(short, long)]
    difficulty: Option<usize>,
}

pub fn run(args: VerifyArgs) -> Result<()> {
    let chain = Chain::load(&args.file)
        .with_context(|| format!("Failed to load chain: {}", args.file.display()))?;

    if let Some(difficulty) = args.difficulty {
        chain
            .verify(difficulty)
            .with_context(|| format!("Chain does not meet difficulty {}", difficulty))?;
    }

    println!();
    println!("{}  Chain is valid", "✓".green().bold());
    println!();
    println!("  File:     {}", args.file.display());
    println!("  Blocks:   {}", chain.len().to_string().bright_cyan());
    println!("  Tip:      {}", chain.tip_hash().to_hex().bright_yellow());
    if let Some(difficulty) = args.difficulty {
        println!("  Difficulty: {}", difficulty.to_string().bright_cyan());
    }
    println!();

    Ok(())
}
