//! Result handles for submitted work
//!
//! Each submission is packaged into a type-erased job plus a one-shot
//! channel. The job runs the closure under `catch_unwind` so a panicking
//! task resolves its handle instead of killing the worker.

use super::Job;
use crate::error::{PoolError, PoolResult};
use crossbeam_channel::{bounded, Receiver};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Handle to the eventual result of a submitted task
#[must_use = "dropping a TaskHandle discards the task's result"]
pub struct TaskHandle<R> {
    receiver: Receiver<std::thread::Result<R>>,
}

impl<R> TaskHandle<R> {
    /// Block until the task has run and return its result
    ///
    /// Returns `TaskPanicked` if the closure panicked and `TaskDropped` if
    /// the pool discarded the task at shutdown.
    pub fn join(self) -> PoolResult<R> {
        match self.receiver.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(PoolError::TaskPanicked {
                message: panic_message(payload.as_ref()),
            }),
            Err(_) => Err(PoolError::TaskDropped),
        }
    }

    /// Check whether the result is ready without blocking
    pub fn is_ready(&self) -> bool {
        !self.receiver.is_empty()
    }
}

/// Wrap a closure into a queueable job and the handle that observes it
pub(super) fn package<F, R>(f: F) -> (TaskHandle<R>, Job)
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (sender, receiver) = bounded(1);

    let job: Job = Box::new(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(f));
        // Receiver may already be gone if the caller dropped the handle
        let _ = sender.send(result);
    });

    (TaskHandle { receiver }, job)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
