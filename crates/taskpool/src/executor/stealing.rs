use crate::executor::context::PoolContext;
use crate::executor::interface::{ExecutorService, RoundRobin};
use crate::{CompletionHandle, Error, RandSource, Result, SubmitStatus, TaskRef, ThreadRandom};
use crossbeam_utils::sync::WaitGroup;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// One work-stealing worker: a queue owner plus its victim bookkeeping.
pub(crate) struct StealWorker<R>
where
    R: RandSource,
{
    id: usize,
    context: Arc<PoolContext>,
    rand: R,
    keep_working: Arc<AtomicBool>,
    /// Victim ids not yet tried since the last successful steal.
    untried: Vec<usize>,
}

impl<R> StealWorker<R>
where
    R: RandSource,
{
    pub(crate) fn new(
        id: usize,
        context: Arc<PoolContext>,
        rand: R,
        keep_working: Arc<AtomicBool>,
    ) -> Self {
        let untried = (0..context.capacity()).filter(|&peer| peer != id).collect();
        Self {
            id,
            context,
            rand,
            keep_working,
            untried,
        }
    }

    /// The worker execution loop.
    ///
    /// Runs until the continuation flag is false *and* the whole pool is
    /// idle; the second condition keeps a drained worker participating in
    /// redistribution while its peers still hold work.
    pub(crate) fn run(mut self, barrier: WaitGroup) {
        while self.keep_working.load(Ordering::Acquire) || !self.context.is_idle() {
            let ran = self.drain_own_queue();

            let stole = if self.context.capacity() > 1 && !self.untried.is_empty() {
                self.try_steal()
            } else {
                false
            };

            if !ran && !stole {
                thread::yield_now();
            }
        }

        drop(barrier);
    }

    /// Executes the worker's own tasks, top-first, until the queue reads
    /// empty. Returns whether at least one task was popped.
    fn drain_own_queue(&self) -> bool {
        let mut ran = false;
        while let Some(task) = self.context.queue(self.id).pop_top() {
            ran = true;
            match task.as_runnable() {
                Some(runnable) => runnable.run(),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(worker = self.id, "dropping task without runnable capability");
                }
            }
        }
        ran
    }

    /// One steal attempt: sample an untried victim without replacement and
    /// move a single task from the victim's bottom to our own bottom.
    ///
    /// The attempt fires only when our queue is empty and the victim's is
    /// not; both reads are hints, so the pop result decides. A successful
    /// steal resets the untried set: work reappeared somewhere, so every
    /// peer is worth scanning again. A failed attempt leaves the victim
    /// removed until the set is exhausted.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(worker = self.id)))]
    pub(crate) fn try_steal(&mut self) -> bool {
        let pick = self.rand.rand_below(self.untried.len());
        let victim = self.untried.swap_remove(pick);

        let own = self.context.queue(self.id);
        let victim_queue = self.context.queue(victim);
        if !own.is_empty() || victim_queue.is_empty() {
            return false;
        }

        let context = Arc::clone(&self.context);
        let _transfer = context.begin_transfer();
        let Some(task) = victim_queue.pop_bottom() else {
            // Lost the race against the victim's own drain.
            return false;
        };
        own.push_bottom(task);

        self.reset_untried();
        true
    }

    fn reset_untried(&mut self) {
        self.untried.clear();
        self.untried
            .extend((0..self.context.capacity()).filter(|&peer| peer != self.id));
    }

    #[cfg(test)]
    pub(crate) fn untried(&self) -> &[usize] {
        &self.untried
    }
}

/// An [`ExecutorService`] implemented with the work-stealing algorithm.
///
/// Each worker exhausts its own queue before anything else. Once empty, it
/// samples victims uniformly at random, without replacement, from the set of
/// peers it has not tried since its last successful steal, and moves one
/// task from the victim's bottom end to its own. Stealing therefore only
/// ever transfers work *toward* an idle worker, and a worker whose every
/// peer has come up empty stops probing until a successful steal resets its
/// candidate set.
///
/// ## Recommended when
///
/// - Task costs are uneven or unpredictable, so queues drain at different
///   rates and idle workers should pull work toward themselves.
/// - Producers submit in bursts and the pool should converge on its own.
///
/// ## See also
///
/// - [`WorkBalancingPool`](crate::WorkBalancingPool), which pushes work away from
///   overloaded queues instead of pulling it toward idle ones.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use taskpool::{ExecutorService, FnTask, WorkStealingPool};
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let mut pool = WorkStealingPool::new(4, 1);
///
/// for _ in 0..8 {
///     let counter = Arc::clone(&counter);
///     pool.submit(Arc::new(FnTask::new(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })));
/// }
///
/// pool.shutdown();
/// assert_eq!(counter.load(Ordering::SeqCst), 8);
/// ```
pub struct WorkStealingPool {
    context: Arc<PoolContext>,
    flags: Vec<Arc<AtomicBool>>,
    cursor: RoundRobin,
    barrier: Option<WaitGroup>,
    done: bool,
}

impl WorkStealingPool {
    /// Creates a pool of `capacity` workers using thread-local randomness
    /// for victim selection.
    ///
    /// `claim_threshold` is the advisory number of items a worker may claim
    /// from the pool in one batch; it is accepted for interface completeness
    /// and does not affect scheduling.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or a worker thread cannot be spawned.
    /// For explicitly fallible behavior, use [`Self::try_new`] instead.
    pub fn new(capacity: usize, claim_threshold: usize) -> Self {
        Self::try_new(capacity, claim_threshold).unwrap()
    }

    /// A fallible version of [`Self::new`].
    pub fn try_new(capacity: usize, claim_threshold: usize) -> Result<Self> {
        Self::try_with_rand(capacity, claim_threshold, ThreadRandom)
    }

    /// Creates a pool whose workers draw victims from clones of `rand`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCapacity`] if `capacity` is zero.
    /// - [`Error::Spawn`] if a worker thread cannot be spawned; workers
    ///   spawned before the failure are signaled to exit.
    pub fn try_with_rand<R>(capacity: usize, claim_threshold: usize, rand: R) -> Result<Self>
    where
        R: RandSource + Clone + Send + 'static,
    {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        let context = Arc::new(PoolContext::new(capacity, claim_threshold, 1));
        let barrier = WaitGroup::new();
        let mut flags = Vec::with_capacity(capacity);

        for id in 0..capacity {
            let flag = Arc::new(AtomicBool::new(true));
            let worker =
                StealWorker::new(id, Arc::clone(&context), rand.clone(), Arc::clone(&flag));
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

impl ExecutorService for WorkStealingPool {
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

impl Drop for WorkStealingPool {
    /// A pool dropped without an explicit shutdown still drains and joins
    /// its workers; threads are never leaked.
    fn drop(&mut self) {
        self.shutdown_workers();
    }
}
