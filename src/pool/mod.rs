//! Fixed-size worker pool with a shared FIFO queue
//!
//! The pool is the execution engine for both tree generation and
//! concurrent traversal. Work is submitted as a closure and observed
//! through a [`TaskHandle`]; workers may submit further work through a
//! [`PoolSubmitter`], which is what makes recursive fan-out possible.
//!
//! # Architecture
//!
//! ```text
//!   submit() ──┐        ┌──────────────────────────────┐
//!   submit() ──┼──────► │  Mutex<QueueState>           │
//!   (workers)──┘        │  - jobs: VecDeque<Job> FIFO  │
//!                       │  - busy: usize               │
//!                       │  - stopped: bool             │
//!                       └──────────────┬───────────────┘
//!                                      │ work_available
//!            ┌─────────────────────────┼─────────────────────────┐
//!      ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//!      │ Worker 0  │             │ Worker 1  │     ...     │ Worker N  │
//!      └───────────┘             └───────────┘             └───────────┘
//!                                      │ all_idle
//!                                      ▼
//!                                  drain()
//! ```
//!
//! Queue, busy count and stop flag share one lock, so a worker that has
//! dequeued a job is already counted busy by the time `drain()` can look.

mod handle;
mod worker;

pub use handle::TaskHandle;

use crate::error::{PoolError, PoolResult};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};
use worker::Worker;

/// Type-erased unit of work
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct QueueState {
    /// Pending jobs in submission order
    jobs: VecDeque<Job>,

    /// Workers currently running a job
    busy: usize,

    /// Set once shutdown begins
    stopped: bool,
}

/// State shared between the pool, its workers and its submitters
struct Shared {
    state: Mutex<QueueState>,
    work_available: Condvar,
    all_idle: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            work_available: Condvar::new(),
            all_idle: Condvar::new(),
        }
    }

    fn submit<F, R>(&self, f: F) -> PoolResult<TaskHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (handle, job) = handle::package(f);

        let rejected = {
            let mut state = self.state.lock();
            if state.stopped {
                Some(job)
            } else {
                state.jobs.push_back(job);
                None
            }
        };

        // Drop a rejected job outside the lock; its captures may have Drop impls
        if let Some(job) = rejected {
            drop(job);
            return Err(PoolError::Stopped);
        }

        self.work_available.notify_one();
        Ok(handle)
    }

    fn finish_job(&self) {
        let mut state = self.state.lock();
        state.busy -= 1;
        if state.jobs.is_empty() && state.busy == 0 {
            self.all_idle.notify_all();
        }
    }
}

/// Cloneable handle for submitting work from any thread, including workers
#[derive(Clone)]
pub struct PoolSubmitter {
    shared: Arc<Shared>,
}

impl PoolSubmitter {
    /// Enqueue a closure; fails with `Stopped` once the pool is shutting down
    pub fn submit<F, R>(&self, f: F) -> PoolResult<TaskHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.shared.submit(f)
    }
}

/// Fixed-size pool of worker threads consuming a shared FIFO queue
pub struct WorkerPool {
    /// Queue and synchronization shared with workers
    shared: Arc<Shared>,

    /// Worker threads
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Create a pool and spawn `size` worker threads
    pub fn new(size: usize) -> PoolResult<Self> {
        if size == 0 {
            return Err(PoolError::NoWorkers);
        }

        let mut pool = Self {
            shared: Arc::new(Shared::new()),
            workers: Vec::with_capacity(size),
        };

        // On spawn failure `pool` drops here and joins what already started
        for id in 0..size {
            pool.workers.push(Worker::spawn(id, Arc::clone(&pool.shared))?);
        }

        debug!(workers = size, "Worker pool started");
        Ok(pool)
    }

    /// Enqueue a closure and return a handle to its result
    pub fn submit<F, R>(&self, f: F) -> PoolResult<TaskHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.shared.submit(f)
    }

    /// Get a submitter that work units can capture to fan out further work
    pub fn submitter(&self) -> PoolSubmitter {
        PoolSubmitter {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Block until the queue is empty and no worker is running a job
    ///
    /// Concurrent submitters are not blocked; a caller that needs a true
    /// quiescent point must make sure nothing else is producing work.
    pub fn drain(&self) {
        let mut state = self.shared.state.lock();
        while !(state.jobs.is_empty() && state.busy == 0) {
            self.shared.all_idle.wait(&mut state);
        }
    }

    /// Number of worker threads
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs waiting in the queue
    pub fn queued(&self) -> usize {
        self.shared.state.lock().jobs.len()
    }

    /// Workers currently running a job
    pub fn busy(&self) -> usize {
        self.shared.state.lock().busy
    }

    /// Stop the pool, discard queued work and join every worker
    ///
    /// Jobs still queued are dropped without running; their handles resolve
    /// to `TaskDropped`. Jobs already running are allowed to finish.
    pub fn shutdown(&mut self) {
        let discarded = {
            let mut state = self.shared.state.lock();
            if state.stopped && self.workers.is_empty() {
                return;
            }
            state.stopped = true;
            std::mem::take(&mut state.jobs)
        };

        if !discarded.is_empty() {
            warn!(jobs = discarded.len(), "Discarding queued jobs at shutdown");
        }
        drop(discarded);

        self.shared.work_available.notify_all();
        self.shared.all_idle.notify_all();

        for worker in self.workers.drain(..) {
            let id = worker.id();
            if let Err(e) = worker.join() {
                warn!(worker = id, error = %e, "Worker failed to join cleanly");
            }
        }

        debug!("Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_pool_runs_all_jobs() {
        let pool = WorkerPool::new(4).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    i * 2
                })
                .unwrap()
            })
            .collect();

        let results: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, (0..10).map(|i| i * 2).collect::<Vec<_>>());
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert_eq!(WorkerPool::new(0).err(), Some(PoolError::NoWorkers));
    }

    #[test]
    fn test_single_worker_is_fifo() {
        let pool = WorkerPool::new(1).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..100 {
            let order = Arc::clone(&order);
            let _ = pool.submit(move || order.lock().push(i)).unwrap();
        }

        pool.drain();
        assert_eq!(*order.lock(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_drain_waits_for_running_job() {
        let pool = WorkerPool::new(2).unwrap();
        let finished = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&finished);
        let _ = pool
            .submit(move || {
                thread::sleep(Duration::from_millis(50));
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap();

        pool.drain();
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(pool.queued(), 0);
        assert_eq!(pool.busy(), 0);
    }

    fn fan_out(submitter: PoolSubmitter, depth: u32, counter: Arc<AtomicUsize>) {
        counter.fetch_add(1, Ordering::SeqCst);
        if depth == 0 {
            return;
        }
        for _ in 0..2 {
            let child = submitter.clone();
            let counter = Arc::clone(&counter);
            let _ = submitter
                .submit(move || {
                    thread::sleep(Duration::from_millis(1));
                    fan_out(child, depth - 1, counter)
                })
                .unwrap();
        }
    }

    #[test]
    fn test_drain_covers_recursive_submissions() {
        let pool = WorkerPool::new(2).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let submitter = pool.submitter();
        let c = Arc::clone(&counter);
        let _ = pool.submit(move || fan_out(submitter, 5, c)).unwrap();

        pool.drain();
        // Complete binary tree of depth 5: 2^6 - 1 nodes
        assert_eq!(counter.load(Ordering::SeqCst), 63);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let mut pool = WorkerPool::new(2).unwrap();
        let submitter = pool.submitter();
        pool.shutdown();

        assert_eq!(pool.submit(|| ()).err(), Some(PoolError::Stopped));
        assert_eq!(submitter.submit(|| ()).err(), Some(PoolError::Stopped));
        assert_eq!(pool.worker_count(), 0);

        // Second shutdown is a no-op
        pool.shutdown();
    }

    #[test]
    fn test_shutdown_drops_queued_jobs() {
        let mut pool = WorkerPool::new(1).unwrap();
        let (started_tx, started_rx) = bounded::<()>(1);
        let (release_tx, release_rx) = bounded::<()>(1);

        let running = pool
            .submit(move || {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                "ran"
            })
            .unwrap();
        let queued = pool.submit(|| "never").unwrap();

        // The only worker is now parked inside the first job
        started_rx.recv().unwrap();

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            release_tx.send(()).unwrap();
        });

        pool.shutdown();
        releaser.join().unwrap();

        assert_eq!(running.join(), Ok("ran"));
        assert_eq!(queued.join(), Err(PoolError::TaskDropped));
    }

    #[test]
    fn test_panicking_task_keeps_pool_alive() {
        let pool = WorkerPool::new(1).unwrap();

        let bad = pool.submit(|| -> u32 { panic!("task failure") }).unwrap();
        let good = pool.submit(|| 7u32).unwrap();

        assert!(matches!(bad.join(), Err(PoolError::TaskPanicked { .. })));
        assert_eq!(good.join(), Ok(7));
        pool.drain();
    }
}
