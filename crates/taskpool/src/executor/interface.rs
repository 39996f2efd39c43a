use crate::{SubmitStatus, TaskRef};

/// The uniform task-submission interface implemented by every scheduling
/// strategy.
///
/// A service owns a set of workers (possibly none, for the sequential
/// strategy) and accepts opaque tasks from a single producer. Submission
/// never blocks; shutdown blocks until every worker has drained and exited.
///
/// ## Ordering guarantees
///
/// Tasks submitted to one worker and never redistributed execute in
/// submission order. Submission itself is round-robin across workers, so a
/// batch of `N` tasks lands ⌈N/C⌉ or ⌊N/C⌋ per queue. No global order is
/// guaranteed once stealing or balancing moves a task across queues.
pub trait ExecutorService: Send {
    /// Submits a task for execution.
    ///
    /// Returns [`SubmitStatus::Rejected`] once the service has been shut
    /// down. Otherwise the task is queued (round-robin) and the returned
    /// [`SubmitStatus::Queued`] carries a completion handle iff the task is
    /// [`Completable`](crate::Completable).
    fn submit(&mut self, task: TaskRef) -> SubmitStatus;

    /// Shuts the service down and blocks until every worker has exited.
    ///
    /// Workers keep draining: every task already queued at the moment of the
    /// call is still executed before the corresponding worker exits. Calling
    /// `shutdown` a second time is a no-op.
    fn shutdown(&mut self);
}

/// The "last distributed to" cursor for round-robin placement.
///
/// Starts at `capacity - 1` so the first submission lands on worker 0, and
/// carries its position across calls.
pub(crate) struct RoundRobin {
    prev: usize,
    capacity: usize,
}

impl RoundRobin {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            prev: capacity - 1,
            capacity,
        }
    }

    /// Advances the cursor and returns the next worker id.
    pub(crate) fn next(&mut self) -> usize {
        self.prev = (self.prev + 1) % self.capacity;
        self.prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_cycles_from_worker_zero() {
        let mut cursor = RoundRobin::new(3);
        let picks: Vec<usize> = (0..7).map(|_| cursor.next()).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn cursor_is_stable_at_capacity_one() {
        let mut cursor = RoundRobin::new(1);
        assert_eq!(cursor.next(), 0);
        assert_eq!(cursor.next(), 0);
    }
}
