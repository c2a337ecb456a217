//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod compare;
mod mine;
mod verify;

#[derive(Subcommand)]
pub enum Commands {
    /// Mine blocks and record performance
    Mine(mine::MineArgs),
    /// Check a saved chain file
    Verify(verify::VerifyArgs),
    /// Compare saved runs and report parallel speedup
    Compare(compare::CompareArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Mine(args) => mine::run(args),
        Commands::Verify(args) => verify::run(args),
        Commands::Compare(args) => compare::run(args),
    }
}
