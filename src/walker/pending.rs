//! Pending-work counter for recursive fan-out
//!
//! Concurrent traversal spawns an unknown number of scan tasks, each of
//! which may spawn more. Rather than collecting and awaiting a growing list
//! of handles, every spawned task holds a [`PendingTicket`]:
//!
//! - the ticket is taken (count += 1) before the task is submitted
//! - the ticket is dropped (count -= 1, condvar signaled) after the task has
//!   scanned its own directory, by which point all of its children already
//!   hold tickets
//!
//! The count therefore reaches zero only once every transitively spawned
//! scan has finished. The lock is separate from the worker pool's lock.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Count of outstanding traversal tasks with a wait-for-zero primitive
#[derive(Debug, Default)]
pub struct PendingWork {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one unit of outstanding work
    pub fn begin(self: &Arc<Self>) -> PendingTicket {
        *self.count.lock() += 1;
        PendingTicket {
            pending: Arc::clone(self),
        }
    }

    /// Current number of outstanding units
    pub fn pending(&self) -> usize {
        *self.count.lock()
    }

    /// Block until the count reaches zero
    pub fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count != 0 {
            self.idle.wait(&mut count);
        }
    }

    fn complete(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        self.idle.notify_all();
    }
}

/// RAII guard for one unit of outstanding work
///
/// Dropping the ticket marks the unit finished, including when the task is
/// discarded unexecuted or its submission is rejected.
#[must_use = "dropping a PendingTicket immediately marks the work finished"]
pub struct PendingTicket {
    pending: Arc<PendingWork>,
}

impl Drop for PendingTicket {
    fn drop(&mut self) {
        self.pending.complete();
    }
}
