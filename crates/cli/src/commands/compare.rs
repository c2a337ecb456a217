//! Compare saved sequential and parallel runs.

use crate::display;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use powbench_storage::{ScalingReport, Storage};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Directory holding `pow_performance_*` files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Only use runs mined at this difficulty
    #[arg(short, long)]
    difficulty: Option<usize>,

    /// Do not write the scaling CSV
    #[arg(long)]
    no_save: bool,
}

pub fn run(args: CompareArgs) -> Result<()> {
    if !args.output_dir.is_dir() {
        bail!("Output directory not found: {}", args.output_dir.display());
    }
    let storage = Storage::open(&args.output_dir)?;
    let report = ScalingReport::load(&storage, args.difficulty)
        .with_context(|| format!("Failed to read runs from {}", args.output_dir.display()))?;

    if report.rows.is_empty() {
        bail!(
            "No performance files found in {}",
            args.output_dir.display()
        );
    }

    display::print_scaling(&report);

    if args.no_save {
        return Ok(());
    }
    if let Some(path) = report.save(&storage).context("Failed to save scaling table")? {
        println!("{}  Scaling table saved", "✓".green().bold());
        println!("  {}", path.display().to_string().bright_black());
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::mine::{self, MineArgs};
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CompareArgs,
    }

    #[derive(Parser)]
    struct TestMineCli {
        #[command(flatten)]
        args: MineArgs,
    }

    fn parse(argv: &[&str]) -> CompareArgs {
        let mut full = vec!["powbench"];
        full.extend_from_slice(argv);
        TestCli::try_parse_from(full).unwrap().args
    }

    fn mine_with(argv: &[&str]) {
        let mut full = vec!["powbench"];
        full.extend_from_slice(argv);
        mine::run(TestMineCli::try_parse_from(full).unwrap().args).unwrap();
    }

    #[test]
    fn test_compare_after_mining_both_modes() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();

        mine_with(&["-d", "1", "-n", "2", "-t", "2", "--seed", "1", "-o", dir]);
        mine_with(&[
            "--mode", "parallel", "-d", "1", "-n", "2", "-t", "2", "-w", "2", "--seed", "1", "-o",
            dir,
        ]);

        run(parse(&["-o", dir, "-d", "1"])).unwrap();

        let text = std::fs::read_to_string(tmp.path().join("pow_scaling_d1.csv")).unwrap();
        let rows: Vec<_> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("sequential,1,2,"));
        assert!(rows[1].starts_with("parallel,2,2,"));
    }

    #[test]
    fn test_compare_without_runs_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_str().unwrap();

        assert!(run(parse(&["-o", dir])).is_err());
        assert!(run(parse(&["-o", "/nonexistent/powbench-output"])).is_err());
        assert!(!tmp.path().join("pow_scaling_all.csv").exists());
    }
}
