use std::path::Path;

use colored::Colorize;

use crate::clock::Clock;
use crate::error::Result;
use crate::output::Format;
use crate::stats::{Bucket, StatsReport};
use crate::store::repo::Repo;

const BAR_WIDTH: usize = 20;

pub fn run(data_dir: &Path, clock: &dyn Clock, format: Format) -> Result<()> {
    let repo = Repo::open(data_dir)?;
    let report = StatsReport::compute(&repo.db, clock.today())?;
    match format {
        Format::Json => println!("{}", serde_json::to_string(&report)?),
        Format::Pretty => print_pretty(&report),
        Format::Minimal => println!(
            "{} {} {} {}% {:.1} {:.1}%",
            report.total,
            report.completed,
            report.pending,
            report.completion_percent,
            report.average_completion_days,
            report.on_time_percent
        ),
    }
    Ok(())
}

fn print_pretty(report: &StatsReport) {
    println!("{}", "Completion".bold());
    println!(
        "  {}% ({}/{}) with {} pending",
        report.completion_percent.to_string().green().bold(),
        report.completed,
        report.total,
        report.pending
    );
    println!(
        "  {} {:.1} days",
        "average time to complete:".dimmed(),
        report.average_completion_days
    );
    println!(
        "  {} {:.1}%",
        "finished on time:".dimmed(),
        report.on_time_percent
    );
    println!();
    println!("{}", "Last 4 weeks".bold());
    print_histogram(&report.weekly);
    println!();
    println!("{}", "Last 6 months".bold());
    print_histogram(&report.monthly);
}

fn print_histogram(buckets: &[Bucket]) {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    for bucket in buckets {
        let width = if max == 0 {
            0
        } else {
            (bucket.count as usize * BAR_WIDTH).div_ceil(max as usize)
        };
        let bar = format!("{:<w$}", "█".repeat(width), w = BAR_WIDTH);
        println!("  {:10} {} {}", bucket.label, bar.cyan(), bucket.count);
    }
}
