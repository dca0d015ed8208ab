//! Worker thread logic for the pool
//!
//! Each worker:
//! - Waits on the shared queue until work arrives or the pool stops
//! - Claims one job and marks itself busy before releasing the lock
//! - Runs the job outside the lock
//! - Marks itself idle and wakes drainers once the pool goes quiet

use super::Shared;
use crate::error::{PoolError, PoolResult};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// A long-lived pool worker thread
pub(super) struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a new worker thread
    pub(super) fn spawn(id: usize, shared: Arc<Shared>) -> PoolResult<Self> {
        let handle = thread::Builder::new()
            .name(format!("datagen-worker-{}", id))
            .spawn(move || worker_loop(id, shared))
            .map_err(|e| PoolError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Get worker ID
    pub(super) fn id(&self) -> usize {
        self.id
    }

    /// Wait for the worker to finish
    pub(super) fn join(mut self) -> PoolResult<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PoolError::WorkerPanicked { id: self.id }),
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop(id: usize, shared: Arc<Shared>) {
    debug!(worker = id, "Worker starting");

    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if state.stopped {
                    debug!(worker = id, "Worker shutting down");
                    return;
                }
                if let Some(job) = state.jobs.pop_front() {
                    // Busy before unlock so drain() never sees a false idle
                    state.busy += 1;
                    break job;
                }
                shared.work_available.wait(&mut state);
            }
        };

        trace!(worker = id, "Running job");
        job();

        shared.finish_job();
    }
}
