use crate::TaskRef;
use core::fmt;
use std::sync::Arc;

/// A handle for blocking on a queued task's completion.
///
/// Returned by [`submit`](crate::ExecutorService::submit) when the task
/// exposes the [`Completable`](crate::Completable) capability; the handle is
/// the task itself, retained so the producer can wait without keeping its own
/// reference.
pub struct CompletionHandle {
    task: TaskRef,
}

impl CompletionHandle {
    pub(crate) fn new(task: TaskRef) -> Self {
        Self { task }
    }

    /// Blocks the caller until the task signals completion.
    ///
    /// Completion is driven by the task's own run logic, so waiting on a
    /// task that never runs to completion (or never signals) blocks forever;
    /// the engine adds no timeout of its own.
    pub fn wait(&self) {
        if let Some(completable) = self.task.as_completable() {
            completable.wait();
        }
    }

    /// Returns the underlying task handle.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }
}

impl fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("task", &Arc::as_ptr(&self.task))
            .finish()
    }
}

/// The outcome of submitting a task to an executor service.
///
/// - [`SubmitStatus::Queued`] means the task was accepted and placed on a
///   worker queue (or, for the sequential executor, already ran inline). The
///   `completion` field carries a [`CompletionHandle`] iff the task exposes
///   the [`Completable`](crate::Completable) capability.
/// - [`SubmitStatus::Rejected`] means the service had already been shut down
///   and the task was *not* queued. This is an expected outcome, not an
///   error.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskpool::{ExecutorService, FnTask, WorkBalancingPool};
///
/// let mut pool = WorkBalancingPool::new(2, 4);
/// assert!(pool.submit(Arc::new(FnTask::new(|| {}))).is_queued());
///
/// pool.shutdown();
/// assert!(pool.submit(Arc::new(FnTask::new(|| {}))).is_rejected());
/// ```
#[derive(Debug)]
pub enum SubmitStatus {
    /// The task was accepted and will run (or already ran, inline).
    Queued {
        /// A handle to block on, when the task is
        /// [`Completable`](crate::Completable).
        completion: Option<CompletionHandle>,
    },
    /// The service has been shut down; the task was not queued.
    Rejected,
}

impl SubmitStatus {
    /// Returns whether the task was accepted.
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    /// Returns whether the task was turned away.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// Consumes the status, yielding the completion handle if the task was
    /// queued and waitable.
    pub fn completion(self) -> Option<CompletionHandle> {
        match self {
            Self::Queued { completion } => completion,
            Self::Rejected => None,
        }
    }
}
