//! Metrics reducer
//!
//! Converts counts and elapsed time into throughput (IOPS) and average
//! per-entry latency, and averages read rounds. IOPS counts files plus
//! directories processed per second of wall-clock time.

use crate::generator::GenerateResult;
use crate::walker::EntryCounts;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Throughput and latency of one timed phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseMetrics {
    /// Files plus directories processed
    pub entries: u64,

    /// Wall-clock time of the phase
    pub duration: Duration,
}

impl PhaseMetrics {
    pub fn new(entries: u64, duration: Duration) -> Self {
        Self { entries, duration }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    /// Entries per second; zero when no time elapsed
    pub fn iops(&self) -> f64 {
        iops(self.entries, self.duration)
    }

    /// Average milliseconds per entry; zero when nothing was processed
    pub fn latency_ms(&self) -> f64 {
        latency_ms(self.duration, self.entries)
    }
}

/// One timed traversal of the target tree
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    /// 1-based round number
    pub round: usize,

    pub files: u64,
    pub dirs: u64,
    pub errors: u64,

    /// Entries per second for this round
    pub iops: f64,

    pub duration: Duration,
}

impl RoundResult {
    pub fn new(round: usize, counts: EntryCounts, duration: Duration) -> Self {
        Self {
            round,
            files: counts.files,
            dirs: counts.dirs,
            errors: counts.errors,
            iops: iops(counts.entries(), duration),
            duration,
        }
    }

    pub fn entries(&self) -> u64 {
        self.files + self.dirs
    }

    pub fn latency_ms(&self) -> f64 {
        latency_ms(self.duration, self.entries())
    }
}

/// Average over all read rounds
///
/// Counts are taken from the last round; duration and IOPS are the
/// arithmetic means across rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadSummary {
    pub rounds: usize,
    pub files: u64,
    pub dirs: u64,
    pub errors: u64,
    pub avg_duration: Duration,
    pub avg_iops: f64,
}

impl ReadSummary {
    /// Reduce a sequence of rounds; `None` when there are no rounds
    pub fn from_rounds(rounds: &[RoundResult]) -> Option<Self> {
        let last = rounds.last()?;
        let n = rounds.len() as f64;

        let total_secs: f64 = rounds.iter().map(|r| r.duration.as_secs_f64()).sum();
        let total_iops: f64 = rounds.iter().map(|r| r.iops).sum();

        Some(Self {
            rounds: rounds.len(),
            files: last.files,
            dirs: last.dirs,
            errors: last.errors,
            avg_duration: Duration::from_secs_f64(total_secs / n),
            avg_iops: total_iops / n,
        })
    }

    pub fn entries(&self) -> u64 {
        self.files + self.dirs
    }

    pub fn latency_ms(&self) -> f64 {
        latency_ms(self.avg_duration, self.entries())
    }
}

/// Everything the final report shows
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    pub target: PathBuf,
    pub total_dirs: u64,
    pub total_files: u64,
    pub write: Option<PhaseMetrics>,
    pub read: Option<ReadSummary>,
}

impl PerformanceStats {
    pub fn new(target: &Path) -> Self {
        Self {
            target: target.to_path_buf(),
            total_dirs: 0,
            total_files: 0,
            write: None,
            read: None,
        }
    }

    /// Record the write phase; totals become what was created
    pub fn record_write(&mut self, result: &GenerateResult) {
        self.total_dirs = result.dirs;
        self.total_files = result.files;
        self.write = Some(PhaseMetrics::new(result.entries(), result.duration));
    }

    /// Record the read phase; totals become what the last round counted
    pub fn record_read(&mut self, summary: ReadSummary) {
        self.total_dirs = summary.dirs;
        self.total_files = summary.files;
        self.read = Some(summary);
    }

    pub fn total_entries(&self) -> u64 {
        self.total_dirs + self.total_files
    }
}

fn iops(entries: u64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        entries as f64 / secs
    } else {
        0.0
    }
}

fn latency_ms(duration: Duration, entries: u64) -> f64 {
    if entries > 0 {
        duration.as_secs_f64() * 1000.0 / entries as f64
    } else {
        0.0
    }
}
