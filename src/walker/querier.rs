//! Recursive directory querier (the read workload)
//!
//! Counts regular files and directories under a root. Two modes:
//!
//! - **Sequential**: depth-first recursion on the calling thread.
//! - **Concurrent**: the root is scanned on the calling thread; every
//!   subdirectory found becomes a scan task on the querier's own worker
//!   pool. Tasks fan out further from inside workers, and completion is
//!   detected with [`PendingWork`] rather than by joining task handles.
//!
//! Entries are classified with `DirEntry::file_type`, which does not follow
//! symlinks; anything that is neither a directory nor a regular file is
//! ignored. A directory that fails to read is logged and counted as an
//! error, and the traversal continues elsewhere.

use crate::error::PoolResult;
use crate::pool::{PoolSubmitter, WorkerPool};
use crate::walker::pending::PendingWork;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// How a querier walks the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Depth-first on the calling thread
    Sequential,

    /// Fan out subdirectory scans over a pool of `workers` threads
    Concurrent { workers: usize },
}

/// Caller-supplied counters updated during traversal
#[derive(Debug, Default)]
pub struct EntryCounters {
    /// Regular files found
    pub files: AtomicU64,

    /// Directories found (the root itself is not counted)
    pub dirs: AtomicU64,

    /// Directories whose scan failed or stopped early
    pub errors: AtomicU64,
}

impl EntryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_file(&self) {
        self.files.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dir(&self) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> EntryCounts {
        EntryCounts {
            files: self.files.load(Ordering::SeqCst),
            dirs: self.dirs.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
        }
    }
}

/// Plain counts returned from a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryCounts {
    pub files: u64,
    pub dirs: u64,
    pub errors: u64,
}

impl EntryCounts {
    /// Files plus directories
    pub fn entries(&self) -> u64 {
        self.files + self.dirs
    }
}

/// Walks a directory tree and counts what it finds
pub struct DirectoryQuerier {
    /// Root of the traversal
    root: PathBuf,

    /// Traversal mode
    mode: QueryMode,

    /// Pool for concurrent mode
    pool: Option<WorkerPool>,

    /// Outstanding scan tasks
    pending: Arc<PendingWork>,

    /// Scan tasks submitted over this querier's lifetime
    spawned: Arc<AtomicU64>,
}

impl DirectoryQuerier {
    /// Create a querier; concurrent mode starts its own worker pool
    pub fn new(root: impl Into<PathBuf>, mode: QueryMode) -> PoolResult<Self> {
        let pool = match mode {
            QueryMode::Sequential => None,
            QueryMode::Concurrent { workers } => Some(WorkerPool::new(workers)?),
        };

        Ok(Self {
            root: root.into(),
            mode,
            pool,
            pending: Arc::new(PendingWork::new()),
            spawned: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// Scan tasks currently outstanding
    pub fn pending_tasks(&self) -> usize {
        self.pending.pending()
    }

    /// Scan tasks submitted to the pool so far
    pub fn tasks_spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Walk the whole tree, accumulating into `counters`
    ///
    /// Returns only after every spawned scan has finished. The returned
    /// counts are a snapshot of `counters` at that point, so they include
    /// anything the caller had already accumulated.
    pub fn query_recursively(&self, counters: &Arc<EntryCounters>) -> EntryCounts {
        let scanner = self.scanner(counters);
        scanner.scan(&self.root);

        if self.pool.is_some() {
            self.pending.wait_idle();
        }

        let counts = counters.snapshot();
        debug!(
            root = %self.root.display(),
            files = counts.files,
            dirs = counts.dirs,
            errors = counts.errors,
            tasks = self.tasks_spawned(),
            "Traversal completed"
        );
        counts
    }

    fn scanner(&self, counters: &Arc<EntryCounters>) -> Arc<Scanner> {
        Arc::new(Scanner {
            submitter: self.pool.as_ref().map(WorkerPool::submitter),
            pending: Arc::clone(&self.pending),
            spawned: Arc::clone(&self.spawned),
            counters: Arc::clone(counters),
        })
    }
}

/// Shared context captured by every scan task
struct Scanner {
    submitter: Option<PoolSubmitter>,
    pending: Arc<PendingWork>,
    spawned: Arc<AtomicU64>,
    counters: Arc<EntryCounters>,
}

impl Scanner {
    /// Scan one directory level, descending into subdirectories
    fn scan(self: &Arc<Self>, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.counters.record_error();
                warn!(path = %dir.display(), error = %e, "Failed to read directory");
                return;
            }
        };

        let mut files = 0u64;
        let mut subdirs = 0u64;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.counters.record_error();
                    warn!(path = %dir.display(), error = %e, "Directory iteration failed");
                    break;
                }
            };

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    self.counters.record_error();
                    warn!(path = %entry.path().display(), error = %e, "Failed to read entry type");
                    break;
                }
            };

            if file_type.is_dir() {
                self.counters.record_dir();
                subdirs += 1;
                self.descend(entry.path());
            } else if file_type.is_file() {
                self.counters.record_file();
                files += 1;
            }
        }

        trace!(path = %dir.display(), files = files, subdirs = subdirs, "Directory scanned");
    }

    fn descend(self: &Arc<Self>, path: PathBuf) {
        let Some(submitter) = &self.submitter else {
            self.scan(&path);
            return;
        };

        // Ticket taken before submit, released after the child's own scan
        let ticket = self.pending.begin();
        let scanner = Arc::clone(self);
        let task_path = path.clone();

        let submitted = submitter.submit(move || {
            scanner.scan(&task_path);
            drop(ticket);
        });

        match submitted {
            Ok(handle) => {
                self.spawned.fetch_add(1, Ordering::Relaxed);
                drop(handle);
            }
            Err(e) => {
                self.counters.record_error();
                warn!(path = %path.display(), error = %e, "Failed to submit directory scan");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MODES: [QueryMode; 2] = [QueryMode::Sequential, QueryMode::Concurrent { workers: 4 }];

    fn query(root: &Path, mode: QueryMode) -> EntryCounts {
        let querier = DirectoryQuerier::new(root, mode).unwrap();
        querier.query_recursively(&Arc::new(EntryCounters::new()))
    }

    #[test]
    fn test_empty_root() {
        let root = tempdir().unwrap();
        for mode in MODES {
            assert_eq!(query(root.path(), mode), EntryCounts::default());
        }
    }

    #[test]
    fn test_flat_files_spawn_no_tasks() {
        let root = tempdir().unwrap();
        for i in 0..3 {
            fs::write(root.path().join(format!("file_{}", i)), b"x").unwrap();
        }

        for mode in MODES {
            let querier = DirectoryQuerier::new(root.path(), mode).unwrap();
            let counts = querier.query_recursively(&Arc::new(EntryCounters::new()));

            assert_eq!((counts.files, counts.dirs), (3, 0));
            assert_eq!(querier.pending_tasks(), 0);
            assert_eq!(querier.tasks_spawned(), 0);
        }
    }

    #[test]
    fn test_deep_single_child_chain() {
        let root = tempdir().unwrap();
        let mut dir = root.path().to_path_buf();
        for depth in 0..64 {
            dir = dir.join(format!("d{}", depth));
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("leaf"), b"x").unwrap();

        for mode in MODES {
            let counts = query(root.path(), mode);
            assert_eq!((counts.files, counts.dirs), (1, 64));
        }
    }

    #[test]
    fn test_concurrent_spawns_one_task_per_subdir() {
        let root = tempdir().unwrap();
        for a in 0..3 {
            for b in 0..2 {
                fs::create_dir_all(root.path().join(format!("a{}", a)).join(format!("b{}", b)))
                    .unwrap();
            }
        }

        let querier =
            DirectoryQuerier::new(root.path(), QueryMode::Concurrent { workers: 2 }).unwrap();
        let counts = querier.query_recursively(&Arc::new(EntryCounters::new()));

        assert_eq!(counts.dirs, 9);
        assert_eq!(querier.tasks_spawned(), 9);
        assert_eq!(querier.pending_tasks(), 0);
    }

    #[test]
    fn test_repeated_queries_are_identical() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("x").join("y")).unwrap();
        fs::write(root.path().join("x").join("f"), b"x").unwrap();

        let querier =
            DirectoryQuerier::new(root.path(), QueryMode::Concurrent { workers: 3 }).unwrap();
        let first = querier.query_recursively(&Arc::new(EntryCounters::new()));
        let second = querier.query_recursively(&Arc::new(EntryCounters::new()));

        assert_eq!(first, second);
        assert_eq!((first.files, first.dirs), (1, 2));
    }

    #[test]
    fn test_counters_accumulate_across_calls() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("f"), b"x").unwrap();

        let querier = DirectoryQuerier::new(root.path(), QueryMode::Sequential).unwrap();
        let counters = Arc::new(EntryCounters::new());
        querier.query_recursively(&counters);
        let counts = querier.query_recursively(&counters);

        assert_eq!(counts.files, 2);
    }

    #[test]
    fn test_missing_root_is_logged_error() {
        let root = tempdir().unwrap();
        let missing = root.path().join("does_not_exist");

        for mode in MODES {
            let counts = query(&missing, mode);
            assert_eq!(counts.entries(), 0);
            assert_eq!(counts.errors, 1);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_ignored() {
        use std::os::unix::fs::symlink;

        let root = tempdir().unwrap();
        let real = root.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("f"), b"x").unwrap();
        symlink(&real, root.path().join("dir_link")).unwrap();
        symlink(real.join("f"), root.path().join("file_link")).unwrap();

        for mode in MODES {
            let counts = query(root.path(), mode);
            assert_eq!((counts.files, counts.dirs), (1, 1));
        }
    }

    #[test]
    fn test_failed_scan_in_task_releases_ticket() {
        let root = tempdir().unwrap();
        let querier =
            DirectoryQuerier::new(root.path(), QueryMode::Concurrent { workers: 2 }).unwrap();
        let counters = Arc::new(EntryCounters::new());

        // Directory vanished between listing and scan
        querier.scanner(&counters).descend(root.path().join("vanished"));
        querier.pending.wait_idle();

        assert_eq!(querier.pending_tasks(), 0);
        assert_eq!(querier.tasks_spawned(), 1);
        assert_eq!(counters.snapshot().errors, 1);
    }

    #[test]
    fn test_rejected_submission_releases_ticket() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("child")).unwrap();

        let mut querier =
            DirectoryQuerier::new(root.path(), QueryMode::Concurrent { workers: 2 }).unwrap();
        let counters = Arc::new(EntryCounters::new());
        let scanner = querier.scanner(&counters);
        querier.pool.as_mut().unwrap().shutdown();

        scanner.descend(root.path().join("child"));
        querier.pending.wait_idle();

        assert_eq!(querier.pending_tasks(), 0);
        assert_eq!(querier.tasks_spawned(), 0);
        assert_eq!(counters.snapshot().errors, 1);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let root = tempdir().unwrap();
        assert!(DirectoryQuerier::new(root.path(), QueryMode::Concurrent { workers: 0 }).is_err());
    }
}
