//! Progress reporting and the final benchmark report
//!
//! A spinner runs on stderr while a phase is in flight; round lines and the
//! summary block go to stdout.

use crate::generator::{GenerateProgress, TreeShape};
use crate::stats::{PerformanceStats, ReadSummary, RoundResult};
use crate::walker::QueryMode;
use chrono::Local;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Width of the label column in the summary block
const LABEL_WIDTH: usize = 30;

/// Spinner showing live phase status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        // Template is a literal; fall back to the default style if it is rejected
        let spinner = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(spinner);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the display during tree generation
    pub fn update_generate(&self, progress: &GenerateProgress) {
        let msg = format!(
            "Dirs: {} | Files: {} | Errors: {} | Rate: {:.0}/s",
            format_number(progress.dirs),
            format_number(progress.files),
            format_number(progress.errors),
            progress.entries_per_second(),
        );
        self.bar.set_message(msg);
    }

    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

fn mode_name(mode: QueryMode) -> &'static str {
    match mode {
        QueryMode::Sequential => "sequential",
        QueryMode::Concurrent { .. } => "concurrent",
    }
}

/// Print a header at the start of the run
pub fn print_header(target: &Path, workers: usize, shape: Option<&TreeShape>, mode: Option<QueryMode>) {
    println!();
    println!(
        "{} {}",
        style("datagen").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Target:").bold(), target.display());
    println!("  {} {}", style("Workers:").bold(), workers);
    if let Some(mode) = mode {
        println!("  {} {}", style("Read mode:").bold(), mode_name(mode));
    }
    println!(
        "  {} {}",
        style("Started:").bold(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(shape) = shape {
        println!(
            "  {} {} dirs, {} files ({})",
            style("Expected:").bold(),
            format_number(shape.expected_directories()),
            format_number(shape.expected_files()),
            format_size(shape.expected_bytes(), BINARY)
        );
    }
    println!();
}

/// One line per read round
pub fn format_round(round: &RoundResult) -> String {
    format!(
        "Round {} - Files: {}, Dirs: {}, Duration: {} ms, Read IOPS: {:.0}, Response Time: {:.4} ms",
        round.round,
        round.files,
        round.dirs,
        round.duration.as_millis(),
        round.iops,
        round.latency_ms()
    )
}

/// The averaged line after all rounds
pub fn format_average(summary: &ReadSummary) -> String {
    format!(
        "Average - Files: {}, Dirs: {}, Duration: {} ms, Read IOPS: {:.0}, Response Time: {:.4} ms",
        summary.files,
        summary.dirs,
        summary.avg_duration.as_millis(),
        summary.avg_iops,
        summary.latency_ms()
    )
}

pub fn print_round(round: &RoundResult) {
    println!("{}", format_round(round));
}

pub fn print_average(summary: &ReadSummary) {
    println!("{}", format_average(summary));
    println!("{}", style("─".repeat(58)).dim());
}

/// Left-aligned label padded to the label column
fn row(label: &str, value: impl std::fmt::Display) -> String {
    // Pad before styling so escape codes don't count toward the width
    let padded = format!("{:<width$}", format!("{}:", label), width = LABEL_WIDTH);
    format!("{}{}", style(padded).bold(), value)
}

/// Rows of the final report; a phase that did not run reports zeros
pub fn summary_rows(stats: &PerformanceStats, bytes_written: Option<u64>) -> Vec<String> {
    let mut rows = vec![
        row("Target Directory", stats.target.display()),
        row("Total Dirs", stats.total_dirs),
        row("Total Files", stats.total_files),
        row("Total Files & Dirs", stats.total_entries()),
    ];

    let (write_ms, write_iops, write_latency) = match &stats.write {
        Some(write) => (write.duration.as_millis(), write.iops(), write.latency_ms()),
        None => (0, 0.0, 0.0),
    };
    rows.push(row("Write Duration ms", write_ms));
    rows.push(row("Write IOPS", format!("{:.0}", write_iops)));
    rows.push(row("Write Response Time ms", format!("{:.4}", write_latency)));
    if let (Some(_), Some(bytes)) = (&stats.write, bytes_written) {
        rows.push(row("Bytes Written", format_size(bytes, BINARY)));
    }

    let (read_ms, read_iops, read_latency) = match &stats.read {
        Some(read) => (read.avg_duration.as_millis(), read.avg_iops, read.latency_ms()),
        None => (0, 0.0, 0.0),
    };
    rows.push(row("Read Duration ms", read_ms));
    rows.push(row("Read IOPS", format!("{:.0}", read_iops)));
    rows.push(row("Read Response Time ms", format!("{:.4}", read_latency)));

    rows
}

/// Print the final report block
pub fn print_summary(stats: &PerformanceStats, bytes_written: Option<u64>, errors: u64) {
    println!();
    println!("{}", style("Benchmark Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    for line in summary_rows(stats, bytes_written) {
        println!("{}", line);
    }
    if errors > 0 {
        println!(
            "{}{}",
            style(format!("{:<width$}", "Errors:", width = LABEL_WIDTH))
                .yellow()
                .bold(),
            format_number(errors)
        );
    }
    println!();
}
