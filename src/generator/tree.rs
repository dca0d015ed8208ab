//! Level-by-level parallel tree generation
//!
//! Directories are created on the calling thread; each new directory's
//! files are written by one pool task. The generator waits for every task
//! of a level before recursing into the next one, so at most
//! `dirs_per_level` file batches are outstanding at once and recursion never
//! blocks inside a worker.
//!
//! ```text
//! level L:   mkdir dir_L_0 .. dir_L_{d-1}       (calling thread)
//!            submit batch(dir_L_i) x d  ───────► pool workers write file_0..
//!            join all handles                   (level barrier)
//! level L+1: recurse into each completed dir_L_i, in order
//! ```
//!
//! Failures are absorbed per branch: a directory that cannot be created is
//! skipped, and a directory whose file batch fails is not descended into.

use crate::content::write_random_file;
use crate::error::{BranchOutcome, PoolResult};
use crate::generator::shape::{dir_name, file_name, TreeShape};
use crate::pool::{TaskHandle, WorkerPool};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of a completed generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResult {
    /// Directories created
    pub dirs: u64,

    /// Files written
    pub files: u64,

    /// Directory or file failures absorbed during the run
    pub errors: u64,

    /// Wall-clock time of the run
    pub duration: Duration,
}

impl GenerateResult {
    /// Files plus directories
    pub fn entries(&self) -> u64 {
        self.dirs + self.files
    }
}

/// Progress information for display
#[derive(Debug, Clone, Default)]
pub struct GenerateProgress {
    pub dirs: u64,
    pub files: u64,
    pub errors: u64,
    pub elapsed: Duration,
}

impl GenerateProgress {
    /// Entries (files + dirs) created per second so far
    pub fn entries_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.files + self.dirs) as f64 / secs
        } else {
            0.0
        }
    }
}

/// Writes one file of the given size in KiB
pub type FileWriter = fn(&Path, usize) -> io::Result<()>;

#[derive(Debug, Default, Clone, Copy)]
struct LevelCounts {
    dirs: u64,
    files: u64,
}

/// Generates a directory tree of a given shape using a worker pool
pub struct TreeGenerator<'a> {
    shape: TreeShape,
    pool: &'a WorkerPool,
    write_file: FileWriter,
    dirs_count: Arc<AtomicU64>,
    files_count: Arc<AtomicU64>,
    errors_count: Arc<AtomicU64>,
}

impl<'a> TreeGenerator<'a> {
    pub fn new(shape: TreeShape, pool: &'a WorkerPool) -> Self {
        Self {
            shape,
            pool,
            write_file: write_random_file,
            dirs_count: Arc::new(AtomicU64::new(0)),
            files_count: Arc::new(AtomicU64::new(0)),
            errors_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the function used to write each file
    pub fn with_file_writer(mut self, write_file: FileWriter) -> Self {
        self.write_file = write_file;
        self
    }

    pub fn shape(&self) -> &TreeShape {
        &self.shape
    }

    /// Snapshot of the live counters
    pub fn progress(&self, elapsed: Duration) -> GenerateProgress {
        GenerateProgress {
            dirs: self.dirs_count.load(Ordering::Relaxed),
            files: self.files_count.load(Ordering::Relaxed),
            errors: self.errors_count.load(Ordering::Relaxed),
            elapsed,
        }
    }

    /// Generate the tree under `root`, returning what was actually created
    pub fn generate(&self, root: &Path) -> GenerateResult {
        let start = Instant::now();
        self.dirs_count.store(0, Ordering::Relaxed);
        self.files_count.store(0, Ordering::Relaxed);
        self.errors_count.store(0, Ordering::Relaxed);

        info!(
            root = %root.display(),
            levels = self.shape.num_levels,
            dirs_per_level = self.shape.dirs_per_level,
            workers = self.pool.worker_count(),
            "Starting tree generation"
        );

        let counts = self.generate_level(root, 1);
        let result = GenerateResult {
            dirs: counts.dirs,
            files: counts.files,
            errors: self.errors_count.load(Ordering::Relaxed),
            duration: start.elapsed(),
        };

        info!(
            dirs = result.dirs,
            files = result.files,
            errors = result.errors,
            duration_ms = result.duration.as_millis() as u64,
            "Tree generation completed"
        );

        result
    }

    /// Generate while a helper thread reports progress every 100ms
    ///
    /// The callback receives one final snapshot after generation finishes.
    pub fn run_with_progress<F>(&self, root: &Path, progress_callback: F) -> GenerateResult
    where
        F: Fn(GenerateProgress) + Send + 'static,
    {
        let start = Instant::now();
        let done = Arc::new(AtomicBool::new(false));
        let dirs = Arc::clone(&self.dirs_count);
        let files = Arc::clone(&self.files_count);
        let errors = Arc::clone(&self.errors_count);
        let stop = Arc::clone(&done);

        let snapshot = move || GenerateProgress {
            dirs: dirs.load(Ordering::Relaxed),
            files: files.load(Ordering::Relaxed),
            errors: errors.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };

        let progress_handle = thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                progress_callback(snapshot());
                thread::sleep(Duration::from_millis(100));
            }
            progress_callback(snapshot());
        });

        let result = self.generate(root);

        done.store(true, Ordering::SeqCst);
        let _ = progress_handle.join();

        result
    }

    fn generate_level(&self, parent: &Path, level: usize) -> LevelCounts {
        let mut counts = LevelCounts::default();
        if level > self.shape.num_levels {
            return counts;
        }

        // Directories for this level, best effort
        let mut created = Vec::new();
        for index in 0..self.shape.dirs_per_level {
            let dir = parent.join(dir_name(level, index));
            match fs::create_dir_all(&dir) {
                Ok(()) => {
                    counts.dirs += 1;
                    self.dirs_count.fetch_add(1, Ordering::Relaxed);
                    created.push(dir);
                }
                Err(e) => {
                    self.errors_count.fetch_add(1, Ordering::Relaxed);
                    warn!(path = %dir.display(), error = %e, "Failed to create directory");
                }
            }
        }

        // One file batch per directory, all submitted before any join
        let files_to_create = self.shape.files_for_level(level);
        let submitted: Vec<_> = created
            .into_iter()
            .map(|dir| {
                let handle = self.submit_batch(dir.clone(), files_to_create);
                (dir, handle)
            })
            .collect();

        // Level barrier
        let mut completed = Vec::with_capacity(submitted.len());
        for (dir, handle) in submitted {
            match handle.and_then(TaskHandle::join) {
                Ok(outcome) => {
                    counts.files += outcome.files();
                    if outcome.is_completed() {
                        completed.push(dir);
                    } else {
                        debug!(path = %dir.display(), "Skipping subtree after failed file batch");
                    }
                }
                Err(e) => {
                    self.errors_count.fetch_add(1, Ordering::Relaxed);
                    warn!(path = %dir.display(), error = %e, "File batch did not run");
                }
            }
        }

        for dir in completed {
            let child = self.generate_level(&dir, level + 1);
            counts.dirs += child.dirs;
            counts.files += child.files;
        }

        counts
    }

    fn submit_batch(
        &self,
        dir: PathBuf,
        count: usize,
    ) -> PoolResult<TaskHandle<BranchOutcome>> {
        let size_kb = self.shape.file_size_kb;
        let write_file = self.write_file;
        let files_count = Arc::clone(&self.files_count);
        let errors_count = Arc::clone(&self.errors_count);

        self.pool.submit(move || {
            write_file_batch(write_file, dir, count, size_kb, &files_count, &errors_count)
        })
    }
}

/// Write `count` files into `dir`, stopping at the first failure
fn write_file_batch(
    write_file: FileWriter,
    dir: PathBuf,
    count: usize,
    size_kb: usize,
    files_count: &AtomicU64,
    errors_count: &AtomicU64,
) -> BranchOutcome {
    let mut written = 0u64;

    for index in 0..count {
        let path = dir.join(file_name(index));
        if let Err(e) = write_file(&path, size_kb) {
            errors_count.fetch_add(1, Ordering::Relaxed);
            warn!(path = %path.display(), error = %e, "Failed to write file, aborting branch");
            return BranchOutcome::Failed {
                path: dir,
                files: written,
                reason: e.to_string(),
            };
        }
        written += 1;
        files_count.fetch_add(1, Ordering::Relaxed);
    }

    debug!(path = %dir.display(), files = written, "File batch complete");
    BranchOutcome::Completed {
        path: dir,
        files: written,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::BYTES_PER_KB;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn reference_shape() -> TreeShape {
        TreeShape {
            num_levels: 2,
            dirs_per_level: 2,
            files_per_dir: 1,
            file_size_kb: 1,
            target_level: 2,
            files_at_target_level: 3,
        }
    }

    fn count_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_type().unwrap().is_file())
            .count()
    }

    #[test]
    fn test_reference_scenario() {
        let root = tempdir().unwrap();
        let pool = WorkerPool::new(2).unwrap();
        let generator = TreeGenerator::new(reference_shape(), &pool);

        let result = generator.generate(root.path());

        assert_eq!(result.dirs, 6);
        assert_eq!(result.files, 14);
        assert_eq!(result.errors, 0);

        // Level 1 uses files_per_dir, level 2 uses the target override
        let level1 = root.path().join("dir_1_0");
        assert_eq!(count_files(&level1), 1);
        let level2 = level1.join("dir_2_1");
        assert_eq!(count_files(&level2), 3);
        assert_eq!(fs::metadata(level2.join("file_2")).unwrap().len(), 1024);
    }

    #[test]
    fn test_zero_levels_creates_nothing() {
        let root = tempdir().unwrap();
        let pool = WorkerPool::new(1).unwrap();
        let shape = TreeShape {
            num_levels: 0,
            ..reference_shape()
        };

        let result = TreeGenerator::new(shape, &pool).generate(root.path());
        assert_eq!(result.entries(), 0);
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_directory_skips_only_its_branch() {
        let root = tempdir().unwrap();
        // A regular file where dir_1_0 should go
        fs::write(root.path().join("dir_1_0"), b"blocker").unwrap();

        let pool = WorkerPool::new(2).unwrap();
        let result = TreeGenerator::new(reference_shape(), &pool).generate(root.path());

        // dir_1_1 and its two children survive
        assert_eq!(result.dirs, 3);
        assert_eq!(result.files, 1 + 2 * 3);
        assert_eq!(result.errors, 1);
    }

    #[test]
    fn test_failed_file_batch_aborts_subtree() {
        let root = tempdir().unwrap();
        // A directory where dir_1_0/file_0 should be written
        fs::create_dir_all(root.path().join("dir_1_0").join("file_0")).unwrap();

        let pool = WorkerPool::new(2).unwrap();
        let result = TreeGenerator::new(reference_shape(), &pool).generate(root.path());

        assert_eq!(result.dirs, 2 + 2);
        assert_eq!(result.files, 1 + 2 * 3);
        assert_eq!(result.errors, 1);
        assert!(!root.path().join("dir_1_0").join("dir_2_0").exists());
        assert!(root.path().join("dir_1_1").join("dir_2_0").exists());
    }

    static BARRIER_VIOLATIONS: AtomicU64 = AtomicU64::new(0);
    static LEVEL2_WRITES: AtomicU64 = AtomicU64::new(0);

    fn entries_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.file_name().unwrap().to_str().unwrap().starts_with(prefix))
            .collect()
    }

    /// Checks the level barrier from inside every file write
    fn barrier_checking_writer(path: &Path, size_kb: usize) -> io::Result<()> {
        let dir = path.parent().unwrap();
        let dir_name = dir.file_name().unwrap().to_str().unwrap();

        if dir_name.starts_with("dir_1_") {
            // No level-2 directory may exist while level 1 is being written
            thread::sleep(Duration::from_millis(1));
            let root = dir.parent().unwrap();
            for level1 in entries_with_prefix(root, "dir_1_") {
                if !entries_with_prefix(&level1, "dir_2_").is_empty() {
                    BARRIER_VIOLATIONS.fetch_add(1, Ordering::SeqCst);
                }
            }
        } else if dir_name.starts_with("dir_2_") {
            // Every level-1 file must be complete before level 2 starts
            LEVEL2_WRITES.fetch_add(1, Ordering::SeqCst);
            let root = dir.parent().unwrap().parent().unwrap();
            for level1 in entries_with_prefix(root, "dir_1_") {
                let files = entries_with_prefix(&level1, "file_");
                let complete = files
                    .iter()
                    .filter(|f| fs::metadata(f).unwrap().len() == (size_kb * BYTES_PER_KB) as u64)
                    .count();
                if files.len() != 20 || complete != 20 {
                    BARRIER_VIOLATIONS.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        write_random_file(path, size_kb)
    }

    #[test]
    fn test_level_barrier_orders_writes() {
        let root = tempdir().unwrap();
        let pool = WorkerPool::new(2).unwrap();
        let shape = TreeShape {
            num_levels: 2,
            dirs_per_level: 3,
            files_per_dir: 20,
            file_size_kb: 1,
            target_level: 2,
            files_at_target_level: 2,
        };

        let result = TreeGenerator::new(shape, &pool)
            .with_file_writer(barrier_checking_writer)
            .generate(root.path());

        assert_eq!(result.dirs, 3 + 9);
        assert_eq!(result.files, 3 * 20 + 9 * 2);
        assert_eq!(LEVEL2_WRITES.load(Ordering::SeqCst), 9 * 2);
        assert_eq!(BARRIER_VIOLATIONS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_progress_reports_final_snapshot() {
        let root = tempdir().unwrap();
        let pool = WorkerPool::new(2).unwrap();
        let generator = TreeGenerator::new(reference_shape(), &pool);

        let last = Arc::new(Mutex::new(GenerateProgress::default()));
        let sink = Arc::clone(&last);
        let result = generator.run_with_progress(root.path(), move |p| {
            *sink.lock().unwrap() = p;
        });

        let last = last.lock().unwrap().clone();
        assert_eq!(last.dirs, result.dirs);
        assert_eq!(last.files, result.files);
    }

    #[test]
    fn test_progress_rate() {
        let progress = GenerateProgress {
            dirs: 100,
            files: 900,
            errors: 0,
            elapsed: Duration::from_secs(10),
        };
        assert!((progress.entries_per_second() - 100.0).abs() < 0.1);
    }
}
