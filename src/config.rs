//! Configuration types for datagen
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use crate::generator::TreeShape;
use crate::walker::QueryMode;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 512;

/// Minimum number of read rounds
pub const MIN_ROUNDS: usize = 1;

/// Filesystem load generator and directory traversal benchmark
#[derive(Parser, Debug, Clone)]
#[command(
    name = "datagen",
    version,
    about = "Filesystem load generator and directory traversal benchmark",
    long_about = "Generates a directory tree of configurable depth, fan-out and file population \
                  filled with random printable content, and measures how fast an existing tree \
                  can be enumerated.\n\n\
                  Reports IOPS (files + directories per second) and average response time for \
                  the write phase and the averaged read rounds.",
    after_help = "EXAMPLES:\n    \
        datagen write /mnt/test 3 10 100 4 3 1000\n    \
        datagen read /mnt/test 5 -w 32\n    \
        datagen rw /mnt/test 2 2 1 1 2 3 --rounds 3\n    \
        NUM_THREADS=8 datagen read /mnt/test 3 --sequential"
)]
pub struct CliArgs {
    /// Workload to run
    #[command(subcommand)]
    pub command: Command,

    /// Number of worker threads for both phases
    #[arg(
        short = 'w',
        long,
        global = true,
        env = "NUM_THREADS",
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Traverse on the calling thread instead of fanning out over workers
    #[arg(long, global = true)]
    pub sequential: bool,

    /// Quiet mode - suppress header and spinner
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// Workloads
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a directory tree under TARGET
    #[command(visible_alias = "w")]
    Write(GenerateArgs),

    /// Time ROUNDS recursive traversals of TARGET
    #[command(visible_alias = "r")]
    Read {
        /// Existing directory to traverse
        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// Number of traversal rounds to average
        #[arg(value_name = "ROUNDS")]
        rounds: usize,
    },

    /// Generate a tree, then time traversals of it
    #[command(visible_alias = "write-then-read")]
    Rw {
        #[command(flatten)]
        generate: GenerateArgs,

        /// Number of traversal rounds to average
        #[arg(long, default_value_t = MIN_ROUNDS, value_name = "N")]
        rounds: usize,
    },
}

/// Positional tree parameters shared by `write` and `rw`
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Directory to generate into (created if missing)
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Depth of the tree
    #[arg(value_name = "LEVELS")]
    pub levels: usize,

    /// Subdirectories created under every directory
    #[arg(value_name = "DIRS_PER_LEVEL")]
    pub dirs_per_level: usize,

    /// Files per directory outside the target level
    #[arg(value_name = "FILES_PER_DIR")]
    pub files_per_dir: usize,

    /// Size of every file in KiB
    #[arg(value_name = "FILE_SIZE_KB")]
    pub file_size_kb: usize,

    /// Level whose file count is overridden (1..=LEVELS)
    #[arg(value_name = "TARGET_LEVEL")]
    pub target_level: usize,

    /// Files per directory on the target level
    #[arg(value_name = "FILES_AT_TARGET_LEVEL")]
    pub files_at_target_level: usize,
}

impl GenerateArgs {
    fn shape(&self) -> TreeShape {
        TreeShape {
            num_levels: self.levels,
            dirs_per_level: self.dirs_per_level,
            files_per_dir: self.files_per_dir,
            file_size_kb: self.file_size_kb,
            target_level: self.target_level,
            files_at_target_level: self.files_at_target_level,
        }
    }
}

fn default_workers() -> usize {
    num_cpus::get().clamp(1, MAX_WORKERS)
}

/// Validated write-phase configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateConfig {
    pub target: PathBuf,
    pub shape: TreeShape,
}

/// Validated read-phase configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub target: PathBuf,
    pub rounds: usize,
    pub mode: QueryMode,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Worker threads for generation and for each concurrent read round
    pub workers: usize,

    /// Show header and spinner
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,

    /// Write phase, if requested
    pub generate: Option<GenerateConfig>,

    /// Read phase, if requested
    pub query: Option<QueryConfig>,
}

impl RunConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        let mode = if args.sequential {
            QueryMode::Sequential
        } else {
            QueryMode::Concurrent {
                workers: args.workers,
            }
        };

        let (generate, query) = match args.command {
            Command::Write(generate) => (Some(validate_generate(generate)?), None),
            Command::Read { target, rounds } => {
                validate_rounds(rounds)?;
                validate_existing_dir(&target)?;
                (None, Some(QueryConfig { target, rounds, mode }))
            }
            Command::Rw { generate, rounds } => {
                validate_rounds(rounds)?;
                let generate = validate_generate(generate)?;
                let query = QueryConfig {
                    target: generate.target.clone(),
                    rounds,
                    mode,
                };
                (Some(generate), Some(query))
            }
        };

        Ok(Self {
            workers: args.workers,
            show_progress: !args.quiet,
            verbose: args.verbose,
            generate,
            query,
        })
    }

    /// Directory the run operates on
    pub fn target(&self) -> &Path {
        match (&self.generate, &self.query) {
            (Some(generate), _) => &generate.target,
            (None, Some(query)) => &query.target,
            (None, None) => Path::new(""),
        }
    }
}

fn validate_generate(args: GenerateArgs) -> Result<GenerateConfig, ConfigError> {
    let shape = args.shape();
    shape.validate()?;

    // Missing targets are created; existing ones must be directories
    if args.target.exists() && !args.target.is_dir() {
        return Err(ConfigError::InvalidTarget {
            path: args.target,
            reason: "exists and is not a directory".to_string(),
        });
    }

    Ok(GenerateConfig {
        target: args.target,
        shape,
    })
}

fn validate_rounds(rounds: usize) -> Result<(), ConfigError> {
    if rounds < MIN_ROUNDS {
        return Err(ConfigError::InvalidRounds {
            rounds,
            min: MIN_ROUNDS,
        });
    }
    Ok(())
}

fn validate_existing_dir(path: &Path) -> Result<(), ConfigError> {
    if !path.is_dir() {
        return Err(ConfigError::InvalidTarget {
            path: path.to_path_buf(),
            reason: "not an existing directory".to_string(),
        });
    }
    Ok(())
}
