//! powbench CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod settings;

#[derive(Parser)]
#[command(name = "powbench", version)]
#[command(about = "Sequential versus parallel proof-of-work mining", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: commands::Commands,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = commands::run(cli.command) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
