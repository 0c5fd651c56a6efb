//! Trade log analyzer CLI
//!
//! Standalone tool: reads the JSONL trade log independently of the running
//! engine and prints a summary report (totals, success rate, breakdowns by
//! token / direction / hour-of-day).
//!
//! Usage:
//!   trade-analyzer --log-dir data/trades --year 2026
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use dexarb_engine::tradelog::{analyze, AnalysisReport, Totals};
use dexarb_engine::tradelog::TradeLogWriter;

#[derive(Parser, Debug)]
#[command(name = "trade-analyzer", about = "Summarize the arbitrage engine's trade log")]
struct Cli {
    /// Directory the engine's trade log is written to.
    #[arg(long, default_value = "data/trades")]
    log_dir: String,

    /// Tax/calendar year to analyze. Defaults to the current year.
    #[arg(long)]
    year: Option<i32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let year = cli.year.unwrap_or_else(|| chrono::Utc::now().year());

    let log = TradeLogWriter::new(&cli.log_dir)
        .with_context(|| format!("opening trade log at {}", cli.log_dir))?;
    let entries = log
        .read_year(year)
        .with_context(|| format!("reading trade log entries for {year}"))?;

    if entries.is_empty() {
        println!("No trade log entries found for {year} in {}", cli.log_dir);
        return Ok(());
    }

    let report = analyze(&entries);
    print_report(year, &report);

    Ok(())
}

fn print_report(year: i32, report: &AnalysisReport) {
    println!("\nTrade log summary for {year}");
    println!("─────────────────────────────────────");
    print_totals("overall", &report.overall);

    println!("\nBy token:");
    let mut tokens: Vec<_> = report.by_token.iter().collect();
    tokens.sort_by(|a, b| a.0.cmp(b.0));
    for (token, totals) in tokens {
        print_totals(token, totals);
    }

    println!("\nBy direction:");
    let mut directions: Vec<_> = report.by_direction.iter().collect();
    directions.sort_by(|a, b| a.0.cmp(b.0));
    for (direction, totals) in directions {
        print_totals(direction, totals);
    }

    println!("\nBy hour (UTC):");
    let mut hours: Vec<_> = report.by_hour.iter().collect();
    hours.sort_by_key(|(hour, _)| **hour);
    for (hour, totals) in hours {
        print_totals(&format!("{hour:02}:00"), totals);
    }
}

fn print_totals(label: &str, totals: &Totals) {
    println!(
        "  {label:<10} trades={:<6} success_rate={:<6.1}% net_edge={}",
        totals.trade_count,
        totals.success_rate() * 100.0,
        totals.net_edge
    );
}
