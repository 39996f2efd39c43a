use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// A shared handle to a submitted task.
///
/// The engine only ever transports handles between queues; task state is
/// owned by the producer and never copied.
pub type TaskRef = Arc<dyn Task>;

/// The execution capability: a zero-argument unit of work.
pub trait Runnable: Send + Sync {
    /// Runs the task to completion, synchronously, on the calling worker.
    fn run(&self);
}

/// The completion capability: a latch-style future.
///
/// The engine never signals completion itself. A task that wants waiters to
/// be released must call [`complete`](Completable::complete) from its own
/// [`run`](Runnable::run) logic, exactly once, as the original producer of
/// the result. [`wait`](Completable::wait) blocks the *caller* (typically
/// the submitting thread), never a pool worker.
pub trait Completable: Send + Sync {
    /// Blocks until [`complete`](Completable::complete) has been called.
    ///
    /// Returns immediately if the task already completed.
    fn wait(&self);

    /// Marks the task complete and wakes every waiter.
    fn complete(&self);
}

/// An opaque, caller-supplied unit of work.
///
/// A task is polymorphic over two *optional* capabilities, surfaced as
/// accessor methods that default to `None`:
///
/// - [`Runnable`]: the task can be executed. A task lacking this capability
///   is accepted but silently skipped at execution time.
/// - [`Completable`]: the task supports blocking-wait-for-done. When present,
///   [`submit`](crate::ExecutorService::submit) hands back a
///   [`CompletionHandle`](crate::CompletionHandle) the producer may block on.
///
/// Neither capability is required, and the engine checks for them at
/// execution time and submission-return time respectively.
///
/// # Example
///
/// ```
/// use taskpool::{Completable, Completion, Runnable, Task};
///
/// struct Saturate {
///     completion: Completion,
/// }
///
/// impl Runnable for Saturate {
///     fn run(&self) {
///         // ... do the work, then release any waiters.
///         self.completion.complete();
///     }
/// }
///
/// impl Task for Saturate {
///     fn as_runnable(&self) -> Option<&dyn Runnable> {
///         Some(self)
///     }
///     fn as_completable(&self) -> Option<&dyn Completable> {
///         Some(&self.completion)
///     }
/// }
/// ```
pub trait Task: Send + Sync {
    /// Returns the task's execution capability, if any.
    fn as_runnable(&self) -> Option<&dyn Runnable> {
        None
    }

    /// Returns the task's completion capability, if any.
    fn as_completable(&self) -> Option<&dyn Completable> {
        None
    }
}

/// A two-state (pending/done) completion latch.
///
/// This is the ready-made [`Completable`] implementation: a condition
/// variable guarded by a private lock, waited on by the submitter and
/// signaled by the task once its work is done. Embed one in a task type and
/// return it from [`Task::as_completable`].
///
/// Waiting after the latch is already done returns immediately, and multiple
/// waiters are all released by a single [`complete`](Completable::complete).
pub struct Completion {
    done: Mutex<bool>,
    signaled: Condvar,
}

impl Completion {
    /// Creates a latch in the pending state.
    pub fn new() -> Self {
        Self {
            done: Mutex::new(false),
            signaled: Condvar::new(),
        }
    }

    /// Returns whether the latch has been signaled, without blocking.
    pub fn is_complete(&self) -> bool {
        *self.done.lock()
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl Completable for Completion {
    fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.signaled.wait(&mut done);
        }
    }

    fn complete(&self) {
        let mut done = self.done.lock();
        *done = true;
        self.signaled.notify_all();
    }
}

/// A [`Task`] built from a closure, with a completion latch attached.
///
/// The closure runs on whichever worker pops the task; the latch is signaled
/// immediately after the closure returns, so a producer holding the
/// submission handle can block until the work is done.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use taskpool::{ExecutorService, FnTask, WorkStealingPool};
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let task = {
///     let counter = Arc::clone(&counter);
///     Arc::new(FnTask::new(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }))
/// };
///
/// let mut pool = WorkStealingPool::new(2, 1);
/// let handle = pool.submit(task).completion().unwrap();
/// handle.wait();
///
/// assert_eq!(counter.load(Ordering::SeqCst), 1);
/// pool.shutdown();
/// ```
pub struct FnTask<F>
where
    F: Fn() + Send + Sync,
{
    action: F,
    completion: Completion,
}

impl<F> FnTask<F>
where
    F: Fn() + Send + Sync,
{
    /// Wraps a closure into a submittable, waitable task.
    pub fn new(action: F) -> Self {
        Self {
            action,
            completion: Completion::new(),
        }
    }
}

impl<F> Runnable for FnTask<F>
where
    F: Fn() + Send + Sync,
{
    fn run(&self) {
        (self.action)();
        self.completion.complete();
    }
}

impl<F> Task for FnTask<F>
where
    F: Fn() + Send + Sync,
{
    fn as_runnable(&self) -> Option<&dyn Runnable> {
        Some(self)
    }

    fn as_completable(&self) -> Option<&dyn Completable> {
        Some(&self.completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn completion_starts_pending() {
        let latch = Completion::new();
        assert!(!latch.is_complete());
    }

    #[test]
    fn wait_returns_after_complete() {
        let latch = Arc::new(Completion::new());
        let released = Arc::new(AtomicBool::new(false));

        thread::scope(|s| {
            let waiter = {
                let latch = Arc::clone(&latch);
                let released = Arc::clone(&released);
                s.spawn(move || {
                    latch.wait();
                    released.store(true, Ordering::SeqCst);
                })
            };

            thread::sleep(Duration::from_millis(10));
            assert!(!released.load(Ordering::SeqCst));

            latch.complete();
            waiter.join().unwrap();
            assert!(released.load(Ordering::SeqCst));
        });
    }

    #[test]
    fn wait_after_complete_returns_immediately() {
        let latch = Completion::new();
        latch.complete();
        latch.wait();
        assert!(latch.is_complete());
    }

    #[test]
    fn fn_task_signals_its_latch() {
        let ran = AtomicBool::new(false);
        let task = FnTask::new(|| {
            ran.store(true, Ordering::SeqCst);
        });

        task.as_runnable().unwrap().run();

        assert!(ran.load(Ordering::SeqCst));
        assert!(task.completion.is_complete());
    }
}
