//! datagen - Filesystem Load Generator and Traversal Benchmark
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use datagen::config::{CliArgs, GenerateConfig, QueryConfig, RunConfig, MIN_ROUNDS};
use datagen::content::BYTES_PER_KB;
use datagen::error::ConfigError;
use datagen::generator::{GenerateResult, TreeGenerator};
use datagen::pool::WorkerPool;
use datagen::progress::{print_average, print_header, print_round, print_summary, ProgressReporter};
use datagen::stats::{PerformanceStats, ReadSummary, RoundResult};
use datagen::walker::{DirectoryQuerier, EntryCounters};
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version print to stdout and succeed
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    setup_logging(args.verbose)?;

    let config = RunConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            config.target(),
            config.workers,
            config.generate.as_ref().map(|g| &g.shape),
            config.query.as_ref().map(|q| q.mode),
        );
    }

    let mut stats = PerformanceStats::new(config.target());
    let mut errors = 0u64;
    let mut bytes_written = None;

    if let Some(generate) = &config.generate {
        let result = run_write(generate, config.workers, config.show_progress)
            .context("Write phase failed")?;

        errors += result.errors;
        bytes_written = Some(
            result
                .files
                .saturating_mul(generate.shape.file_size_kb as u64)
                .saturating_mul(BYTES_PER_KB as u64),
        );
        stats.record_write(&result);
    }

    if let Some(query) = &config.query {
        let summary = run_read(query, config.show_progress).context("Read phase failed")?;
        errors += summary.errors;
        stats.record_read(summary);
    }

    print_summary(&stats, bytes_written, errors);

    if errors > 0 {
        info!(errors = errors, "Run completed with errors");
    }

    Ok(())
}

/// Generate the tree on a dedicated pool
fn run_write(
    config: &GenerateConfig,
    workers: usize,
    show_progress: bool,
) -> datagen::Result<GenerateResult> {
    fs::create_dir_all(&config.target)?;

    let pool = WorkerPool::new(workers)?;
    let generator = TreeGenerator::new(config.shape, &pool);

    let result = if show_progress {
        let reporter = Arc::new(ProgressReporter::new());
        let display = Arc::clone(&reporter);
        let result = generator.run_with_progress(&config.target, move |progress| {
            display.update_generate(&progress);
        });
        reporter.finish("Write phase completed");
        result
    } else {
        generator.generate(&config.target)
    };

    if result.files != config.shape.expected_files()
        || result.dirs != config.shape.expected_directories()
    {
        warn!(
            dirs = result.dirs,
            expected_dirs = config.shape.expected_directories(),
            files = result.files,
            expected_files = config.shape.expected_files(),
            "Generated tree is smaller than requested"
        );
    }

    Ok(result)
}

/// Time each traversal round with a fresh querier
fn run_read(config: &QueryConfig, show_progress: bool) -> datagen::Result<ReadSummary> {
    let mut rounds = Vec::with_capacity(config.rounds);

    for round in 1..=config.rounds {
        let querier = DirectoryQuerier::new(&config.target, config.mode)?;
        let counters = Arc::new(EntryCounters::new());

        let spinner = show_progress.then(ProgressReporter::new);
        if let Some(ref s) = spinner {
            s.set_status(&format!("Read round {}/{}", round, config.rounds));
        }

        let start = Instant::now();
        let counts = querier.query_recursively(&counters);
        let elapsed = start.elapsed();

        if let Some(ref s) = spinner {
            s.finish_and_clear();
        }

        if counts.errors > 0 {
            warn!(round = round, errors = counts.errors, "Read round had errors");
        }

        let result = RoundResult::new(round, counts, elapsed);
        print_round(&result);
        rounds.push(result);
    }

    let summary = ReadSummary::from_rounds(&rounds).ok_or(ConfigError::InvalidRounds {
        rounds: 0,
        min: MIN_ROUNDS,
    })?;
    print_average(&summary);

    Ok(summary)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("datagen=debug,warn")
    } else {
        EnvFilter::new("datagen=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
