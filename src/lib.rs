//! datagen - Filesystem Load Generator and Traversal Benchmark
//!
//! Synthesizes a directory tree of configurable depth, fan-out and file
//! population, filling every file with random printable content, and
//! measures how fast an existing tree can be recursively enumerated.
//!
//! # Features
//!
//! - **Level-barrier generation**: directories are created level by level;
//!   each directory's files are written by one pool task, and a level is
//!   fully written before the next one starts.
//!
//! - **Sequential or concurrent traversal**: the concurrent querier fans out
//!   one task per subdirectory and detects completion with a pending-work
//!   counter instead of joining handles.
//!
//! - **Fault-absorbing**: a failed mkdir, write or readdir prunes only its
//!   own branch; counts reflect what actually happened.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         CLI driver                               │
//! │          write | read | rw   →   PerformanceStats                │
//! └───────────────┬──────────────────────────────┬──────────────────┘
//!                 │                              │
//!                 ▼                              ▼
//! ┌───────────────────────────┐    ┌───────────────────────────────┐
//! │      TreeGenerator        │    │      DirectoryQuerier         │
//! │  mkdir level L (caller)   │    │  scan root (caller)           │
//! │  submit file batches      │    │  submit scan per subdir       │
//! │  join all (barrier)       │    │  wait pending == 0            │
//! └─────────────┬─────────────┘    └───────────────┬───────────────┘
//!               │                                  │
//!               ▼                                  ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        WorkerPool                                │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │     │
//! │  └─────────┘  └─────────┘  └─────────┘         └─────────┘     │
//! │           FIFO queue + busy count + stop flag (one lock)        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # 3 levels, 10 dirs per level, 100 x 4 KiB files per dir, 1000 on level 3
//! datagen write /mnt/test 3 10 100 4 3 1000
//!
//! # Average five concurrent traversals
//! datagen read /mnt/test 5 -w 32
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod pool;
pub mod progress;
pub mod stats;
pub mod walker;

pub use config::{CliArgs, RunConfig};
pub use error::{BenchError, BranchOutcome, ConfigError, PoolError, Result};
pub use generator::{GenerateResult, TreeGenerator, TreeShape};
pub use pool::{TaskHandle, WorkerPool};
pub use walker::{DirectoryQuerier, EntryCounters, EntryCounts, QueryMode};
