//! Error types for datagen
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI validation errors
//! - Worker pool errors (submission, task failure, thread lifecycle)
//! - Per-branch outcomes of generation and traversal
//!
//! Filesystem failures inside a generation or traversal branch are logged
//! and absorbed where they happen; they show up as `BranchOutcome::Failed`
//! and in error counters, never as a `BenchError`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the datagen application
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker pool errors
    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    /// I/O errors outside of an individual branch
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Target level outside the generated tree
    #[error("Invalid target level {target_level}: must be between 1 and {num_levels}")]
    InvalidTargetLevel {
        target_level: usize,
        num_levels: usize,
    },

    /// Fan-out too large to generate
    #[error("Invalid dirs per level {count}: must be at most {max}")]
    InvalidDirsPerLevel { count: usize, max: usize },

    /// File size too large to hold in memory
    #[error("Invalid file size {size_kb} KiB: must be at most {max} KiB")]
    InvalidFileSize { size_kb: usize, max: usize },

    /// Invalid number of read rounds
    #[error("Invalid round count {rounds}: must be at least {min}")]
    InvalidRounds { rounds: usize, min: usize },

    /// Target path unusable for the requested mode
    #[error("Invalid target '{path}': {reason}")]
    InvalidTarget { path: PathBuf, reason: String },
}

/// Worker pool errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Pool constructed with zero workers
    #[error("Worker pool needs at least one worker")]
    NoWorkers,

    /// Worker thread could not be spawned
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Submission after shutdown began
    #[error("Submit on stopped worker pool")]
    Stopped,

    /// The submitted closure panicked
    #[error("Task panicked: {message}")]
    TaskPanicked { message: String },

    /// The task was discarded at shutdown without running
    #[error("Task dropped before it ran")]
    TaskDropped,

    /// A worker thread panicked outside of a task
    #[error("Worker {id} panicked")]
    WorkerPanicked { id: usize },
}

/// Result type alias for BenchError
pub type Result<T> = std::result::Result<T, BenchError>;

/// Result type alias for PoolError
pub type PoolResult<T> = std::result::Result<T, PoolError>;

/// Outcome of one generation or traversal branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// Branch finished its own work
    Completed { path: PathBuf, files: u64 },

    /// Branch stopped early; `files` counts what finished before the failure
    Failed {
        path: PathBuf,
        files: u64,
        reason: String,
    },
}

impl BranchOutcome {
    /// Returns true if this outcome represents success
    pub fn is_completed(&self) -> bool {
        matches!(self, BranchOutcome::Completed { .. })
    }

    /// Files finished by this branch, regardless of outcome
    pub fn files(&self) -> u64 {
        match self {
            BranchOutcome::Completed { files, .. } => *files,
            BranchOutcome::Failed { files, .. } => *files,
        }
    }

    /// Returns the path associated with this outcome
    pub fn path(&self) -> &PathBuf {
        match self {
            BranchOutcome::Completed { path, .. } => path,
            BranchOutcome::Failed { path, .. } => path,
        }
    }
}
