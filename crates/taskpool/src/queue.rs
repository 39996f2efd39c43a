use crate::TaskRef;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A double-ended, unbounded queue of task handles.
///
/// Every worker owns exactly one `TaskQueue`. The owner retrieves work from
/// the *top* end ([`pop_top`](TaskQueue::pop_top)), which mirrors the
/// submission side pushing at the *bottom* end
/// ([`push_bottom`](TaskQueue::push_bottom)) and therefore yields
/// first-pushed, first-executed order for tasks no peer ever touches. Peers
/// redistributing work (stealers and balancers) operate at the bottom end
/// ([`pop_bottom`](TaskQueue::pop_bottom)), away from the owner.
///
/// ## Concurrency contract
///
/// Structural mutation (any push or pop, by the owner or a peer) is
/// mutually exclusive through a single per-queue lock held for the duration
/// of that one operation. The queue length is additionally mirrored into an
/// atomic counter that can be read without the lock; that read is a
/// *best-effort hint* and may be stale while a mutation is in flight. Callers
/// must never treat the hint as a reservation: every check-then-act sequence
/// in the engine revalidates through the `Option` returned by the pop itself.
pub struct TaskQueue {
    entries: Mutex<VecDeque<TaskRef>>,
    len: AtomicUsize,
}

impl TaskQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            len: AtomicUsize::new(0),
        }
    }

    /// Appends a task at the bottom end. Amortized O(1).
    pub fn push_bottom(&self, task: TaskRef) {
        let mut entries = self.entries.lock();
        entries.push_back(task);
        self.len.store(entries.len(), Ordering::Release);
    }

    /// Removes and returns the top-end task, or `None` if the queue is
    /// empty. O(1).
    pub fn pop_top(&self) -> Option<TaskRef> {
        let mut entries = self.entries.lock();
        let task = entries.pop_front();
        self.len.store(entries.len(), Ordering::Release);
        task
    }

    /// Removes and returns the bottom-end task, or `None` if the queue is
    /// empty. O(1).
    pub fn pop_bottom(&self) -> Option<TaskRef> {
        let mut entries = self.entries.lock();
        let task = entries.pop_back();
        self.len.store(entries.len(), Ordering::Release);
        task
    }

    /// Returns the number of queued tasks via the lock-free fast path.
    ///
    /// The value is exact whenever no mutation is in flight, and at worst one
    /// mutation stale otherwise. See the type-level contract.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns whether the queue is empty, via the same fast path as
    /// [`len`](TaskQueue::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnTask;
    use std::sync::Arc;
    use std::thread;

    fn inert() -> TaskRef {
        Arc::new(FnTask::new(|| {}))
    }

    #[test]
    fn new_queue_is_empty() {
        let queue = TaskQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.pop_top().is_none());
        assert!(queue.pop_bottom().is_none());
    }

    #[test]
    fn pop_top_yields_submission_order() {
        let queue = TaskQueue::new();
        let (first, second, third) = (inert(), inert(), inert());

        queue.push_bottom(Arc::clone(&first));
        queue.push_bottom(Arc::clone(&second));
        queue.push_bottom(Arc::clone(&third));
        assert_eq!(queue.len(), 3);

        assert!(Arc::ptr_eq(&queue.pop_top().unwrap(), &first));
        assert!(Arc::ptr_eq(&queue.pop_top().unwrap(), &second));
        assert!(Arc::ptr_eq(&queue.pop_top().unwrap(), &third));
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_bottom_yields_newest_first() {
        let queue = TaskQueue::new();
        let (first, second) = (inert(), inert());

        queue.push_bottom(Arc::clone(&first));
        queue.push_bottom(Arc::clone(&second));

        assert!(Arc::ptr_eq(&queue.pop_bottom().unwrap(), &second));
        assert!(Arc::ptr_eq(&queue.pop_bottom().unwrap(), &first));
    }

    #[test]
    fn both_ends_drain_to_empty() {
        let queue = TaskQueue::new();
        for _ in 0..4 {
            queue.push_bottom(inert());
        }

        assert!(queue.pop_top().is_some());
        assert!(queue.pop_bottom().is_some());
        assert!(queue.pop_top().is_some());
        assert!(queue.pop_bottom().is_some());
        assert!(queue.pop_top().is_none());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn concurrent_pushes_preserve_count() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 100;

        let queue = TaskQueue::new();
        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..PER_THREAD {
                        queue.push_bottom(inert());
                    }
                });
            }
        });

        assert_eq!(queue.len(), THREADS * PER_THREAD);
        let mut drained = 0;
        while queue.pop_top().is_some() {
            drained += 1;
        }
        assert_eq!(drained, THREADS * PER_THREAD);
    }
}
