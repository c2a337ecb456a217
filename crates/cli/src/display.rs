//! Console output helpers.

use colored::Colorize;
use powbench_chain::SessionReport;
use powbench_storage::{BlockRecord, ScalingReport, WorkerShareRecord, WorkerSummaryRecord};

pub fn format_hash_rate(rate: f64) -> String {
    if rate >= 1_000_000.0 {
        format!("{:.2} MH/s", rate / 1_000_000.0)
    } else if rate >= 1_000.0 {
        format!("{:.2} KH/s", rate / 1_000.0)
    } else {
        format!("{:.2} H/s", rate)
    }
}

pub fn format_time(seconds: f64) -> String {
    if seconds >= 60.0 {
        let minutes = (seconds / 60.0).floor();
        format!("{}m {:.2}s", minutes as u64, seconds - minutes * 60.0)
    } else {
        format!("{:.2}s", seconds)
    }
}

/// Integer with `,` thousands separators.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn print_header(mode: &str, difficulty: usize, blocks: usize, txs: usize, workers: usize) {
    println!();
    println!("{}", format!("Mining ({mode})").bold().cyan());
    println!();
    println!("  Difficulty:   {}", difficulty.to_string().bright_cyan());
    println!("  Blocks:       {}", blocks.to_string().bright_cyan());
    println!("  Txs/block:    {}", txs.to_string().bright_cyan());
    println!("  Workers:      {}", workers.to_string().bright_cyan());
    println!();
}

pub fn print_block(record: &BlockRecord, shares: &[WorkerShareRecord]) {
    println!(
        "  {} {} {}",
        format!("#{}", record.block_number).bright_black(),
        record.hash[..16].bright_yellow(),
        format!(
            "nonce {} in {} ({})",
            record.nonce,
            format_time(record.elapsed_time),
            format_hash_rate(record.hash_rate)
        )
        .bright_black()
    );
    for share in shares {
        println!(
            "      W{}: {} ({:.1}%)",
            share.worker_id,
            format_count(share.nonces_tested),
            share.percentage
        );
    }
}

pub fn print_summary(report: &SessionReport) {
    let blocks = report.blocks.len();

    println!();
    println!("{}", "Mining Summary:".bold().cyan());
    println!();
    println!("  Blocks Mined:      {}", blocks.to_string().bright_cyan());
    println!("  Total Time:        {}", format_time(report.total_time));
    println!(
        "  Nonces Tested:     {}",
        format_count(report.total_nonces_tested).bright_cyan()
    );
    println!(
        "  Average Hash Rate: {}",
        format_hash_rate(report.average_hash_rate()).bright_yellow()
    );
    if blocks > 0 {
        println!(
            "  Avg Time/Block:    {}",
            format_time(report.total_time / blocks as f64)
        );
    }
    println!();
}

pub fn print_worker_summary(workers: &[WorkerSummaryRecord]) {
    if workers.is_empty() {
        return;
    }
    println!("{}", "Worker Performance:".bold().cyan());
    println!();
    for worker in workers {
        println!(
            "  W{:<3} {:>3} found  {:>14} tested  {:>10}  {}",
            worker.worker_id,
            worker.blocks_found,
            format_count(worker.total_attempts),
            format_time(worker.total_time_seconds),
            format_hash_rate(worker.hash_rate()).bright_yellow()
        );
    }
    println!();
}

pub fn print_scaling(report: &ScalingReport) {
    let scope = match report.difficulty {
        Some(d) => format!("difficulty {d}"),
        None => "all difficulties".to_string(),
    };

    println!();
    println!("{}", format!("Strong Scaling ({scope})").bold().cyan());
    println!();
    println!(
        "  {:<11} {:>7} {:>7} {:>12} {:>12} {:>16} {:>10}",
        "Mode", "Workers", "Blocks", "Mean (s)", "Std dev (s)", "Speedup", "Efficiency"
    );
    for row in &report.rows {
        let speedup = format!("{:.2} ± {:.2}", row.speedup, row.speedup_std_dev);
        println!(
            "  {:<11} {:>7} {:>7} {:>12.4} {:>12.4} {:>16} {:>9.1}%",
            row.mode,
            row.workers,
            row.samples,
            row.mean_time,
            row.std_dev,
            speedup.bright_yellow(),
            row.efficiency * 100.0
        );
    }
    println!();
}
