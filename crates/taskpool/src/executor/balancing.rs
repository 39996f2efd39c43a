use crate::executor::context::PoolContext;
use crate::executor::interface::{ExecutorService, RoundRobin};
use crate::{CompletionHandle, Error, RandSource, Result, SubmitStatus, TaskRef, ThreadRandom};
use crossbeam_utils::sync::WaitGroup;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// One work-balancing worker.
pub(crate) struct BalanceWorker<R>
where
    R: RandSource,
{
    id: usize,
    context: Arc<PoolContext>,
    rand: R,
    keep_working: Arc<AtomicBool>,
}

impl<R> BalanceWorker<R>
where
    R: RandSource,
{
    pub(crate) fn new(
        id: usize,
        context: Arc<PoolContext>,
        rand: R,
        keep_working: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            context,
            rand,
            keep_working,
        }
    }

    /// The worker execution loop.
    ///
    /// Each iteration executes at most one own task, then decides whether to
    /// rebalance by drawing a uniform integer in `[0, own_size]` and firing
    /// on a draw equal to `own_size`. The expected attempt frequency is
    /// `1/(size + 1)`, so a draining queue volunteers to rebalance more and
    /// more often as it empties.
    pub(crate) fn run(mut self, barrier: WaitGroup) {
        while self.keep_working.load(Ordering::Acquire) || !self.context.is_idle() {
            let mut ran = false;
            if let Some(task) = self.context.queue(self.id).pop_top() {
                ran = true;
                match task.as_runnable() {
                    Some(runnable) => runnable.run(),
                    None => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(
                            worker = self.id,
                            "dropping task without runnable capability"
                        );
                    }
                }
            }

            let mut moved = false;
            let size = self.context.queue(self.id).len();
            if self.context.capacity() > 1 && self.rand.rand_below(size + 1) == size {
                moved = self.balance();
            }

            if !ran && !moved {
                thread::yield_now();
            }
        }

        drop(barrier);
    }

    /// One balance attempt against a uniformly chosen peer.
    ///
    /// The pair is ordered canonically by id before the size comparison so
    /// two workers balancing against each other designate the same queue as
    /// the larger one. Tasks then move bottom-to-bottom from the larger
    /// queue to the smaller one while the gap is at least the configured
    /// threshold, re-reading both sizes every iteration; an empty pop means
    /// a concurrent drain won the race, and the attempt stops there.
    ///
    /// Returns whether at least one task moved.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(worker = self.id)))]
    pub(crate) fn balance(&mut self) -> bool {
        let peer = self.random_peer();
        let (low, high) = if peer < self.id {
            (peer, self.id)
        } else {
            (self.id, peer)
        };

        let (small, large) = if self.context.queue(low).len() < self.context.queue(high).len() {
            (self.context.queue(low), self.context.queue(high))
        } else {
            (self.context.queue(high), self.context.queue(low))
        };

        let threshold = self.context.balance_threshold();
        let mut moved = false;
        loop {
            if large.len().saturating_sub(small.len()) < threshold {
                break;
            }

            let _transfer = self.context.begin_transfer();
            let Some(task) = large.pop_bottom() else {
                break;
            };
            small.push_bottom(task);
            moved = true;
        }
        moved
    }

    /// Draws a peer id uniformly from `[0, capacity) \ {self}`.
    fn random_peer(&mut self) -> usize {
        let pick = self.rand.rand_below(self.context.capacity() - 1);
        if pick >= self.id { pick + 1 } else { pick }
    }
}

/// An [`ExecutorService`] implemented with the work-balancing algorithm.
///
/// Instead of waiting for a queue to run dry, every worker occasionally
/// pairs up with a random peer and evens out the two queues: while their
/// sizes differ by at least the balance threshold λ, one task moves from the
/// bottom of the larger queue to the bottom of the smaller one. The attempt
/// itself is probabilistic, triggered with probability `1/(size + 1)` after
/// each executed task, so lightly loaded workers volunteer most often.
/// Convergence is pairwise, not global: one invocation narrows a single pair
/// to within λ.
///
/// ## Recommended when
///
/// - Task costs are roughly uniform, so queue *length* is a good proxy for
///   remaining work and proactive evening-out pays off.
/// - λ can be tuned: small values trade transfer traffic for tighter
///   balance, large values the reverse.
///
/// ## See also
///
/// - [`WorkStealingPool`](crate::WorkStealingPool), which pulls work toward idle
///   workers instead of pushing it off loaded ones.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use taskpool::{ExecutorService, FnTask, WorkBalancingPool};
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let mut pool = WorkBalancingPool::new(2, 4);
///
/// for _ in 0..10 {
///     let counter = Arc::clone(&counter);
///     pool.submit(Arc::new(FnTask::new(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })));
/// }
///
/// pool.shutdown();
/// assert_eq!(counter.load(Ordering::SeqCst), 10);
/// ```
pub struct WorkBalancingPool {
    context: Arc<PoolContext>,
    flags: Vec<Arc<AtomicBool>>,
    cursor: RoundRobin,
    barrier: Option<WaitGroup>,
    done: bool,
}

impl WorkBalancingPool {
    /// Creates a pool of `capacity` workers with balance threshold
    /// `balance_threshold` (λ), using thread-local randomness for peer
    /// selection.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `balance_threshold` is zero, or if a worker
    /// thread cannot be spawned. For explicitly fallible behavior, use
    /// [`Self::try_new`] instead.
    pub fn new(capacity: usize, balance_threshold: usize) -> Self {
        Self::try_new(capacity, balance_threshold).unwrap()
    }

    /// A fallible version of [`Self::new`].
    pub fn try_new(capacity: usize, balance_threshold: usize) -> Result<Self> {
        Self::try_with_rand(capacity, balance_threshold, ThreadRandom)
    }

    /// Creates a pool whose workers draw peers from clones of `rand`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCapacity`] if `capacity` is zero.
    /// - [`Error::InvalidBalanceThreshold`] if `balance_threshold` is zero.
    /// - [`Error::Spawn`] if a worker thread cannot be spawned; workers
    ///   spawned before the failure are signaled to exit.
    pub fn try_with_rand<R>(capacity: usize, balance_threshold: usize, rand: R) -> Result<Self>
    where
        R: RandSource + Clone + Send + 'static,
    {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        if balance_threshold == 0 {
            return Err(Error::InvalidBalanceThreshold(balance_threshold));
        }

        let context = Arc::new(PoolContext::new(capacity, 1, balance_threshold));
        let barrier = WaitGroup::new();
        let mut flags = Vec::with_capacity(capacity);

        for id in 0..capacity {
            let flag = Arc::new(AtomicBool::new(true));
            let worker =
                BalanceWorker::new(id, Arc::clone(&context), rand.clone(), Arc::clone(&flag));
            let worker_barrier = barrier.clone();

            let spawned = thread::Builder::new()
                .name(format!("taskpool-worker-{id}"))
                .spawn(move || worker.run(worker_barrier));

            match spawned {
                Ok(_) => flags.push(flag),
                Err(err) => {
                    for flag in &flags {
                        flag.store(false, Ordering::Release);
                    }
                    return Err(err.into());
                }
            }
        }

        Ok(Self {
            context,
            flags,
            cursor: RoundRobin::new(capacity),
            barrier: Some(barrier),
            done: false,
        })
    }

    fn shutdown_workers(&mut self) {
        self.done = true;
        for flag in &self.flags {
            flag.store(false, Ordering::Release);
        }
        if let Some(barrier) = self.barrier.take() {
            barrier.wait();
        }
    }
}

impl ExecutorService for WorkBalancingPool {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    fn submit(&mut self, task: TaskRef) -> SubmitStatus {
        if self.done {
            return SubmitStatus::Rejected;
        }

        let completion = task
            .as_completable()
            .is_some()
            .then(|| CompletionHandle::new(Arc::clone(&task)));
        self.context.queue(self.cursor.next()).push_bottom(task);

        SubmitStatus::Queued { completion }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    fn shutdown(&mut self) {
        self.shutdown_workers();
    }
}

impl Drop for WorkBalancingPool {
    /// A pool dropped without an explicit shutdown still drains and joins
    /// its workers; threads are never leaked.
    fn drop(&mut self) {
        self.shutdown_workers();
    }
}
