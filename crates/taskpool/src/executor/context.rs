use crate::TaskQueue;
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared, immutable-after-construction pool state.
///
/// Holds the arena of per-worker queues (indexed by worker id), the
/// capacity, the algorithm thresholds, and the transfer-tracking atomics
/// that back [`is_idle`](PoolContext::is_idle). Each queue slot is
/// cache-padded so one worker hammering its own queue does not false-share
/// with its neighbors.
pub(crate) struct PoolContext {
    queues: Box<[CachePadded<TaskQueue>]>,
    claim_threshold: usize,
    balance_threshold: usize,
    in_flight: AtomicUsize,
    transfer_epoch: AtomicUsize,
}

impl PoolContext {
    pub(crate) fn new(capacity: usize, claim_threshold: usize, balance_threshold: usize) -> Self {
        let queues = (0..capacity)
            .map(|_| CachePadded::new(TaskQueue::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            queues,
            claim_threshold,
            balance_threshold,
            in_flight: AtomicUsize::new(0),
            transfer_epoch: AtomicUsize::new(0),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.queues.len()
    }

    pub(crate) fn queue(&self, id: usize) -> &TaskQueue {
        &self.queues[id]
    }

    /// Advisory work-stealing batch size; stored, never consulted.
    #[allow(dead_code)]
    pub(crate) fn claim_threshold(&self) -> usize {
        self.claim_threshold
    }

    /// Minimum size gap before a balance transfer fires.
    pub(crate) fn balance_threshold(&self) -> usize {
        self.balance_threshold
    }

    /// Marks the start of one pop→push transfer between two queues.
    ///
    /// A redistributing worker must hold the returned guard across the pair,
    /// so that a task which is momentarily in *no* queue still keeps the pool
    /// observably non-idle.
    pub(crate) fn begin_transfer(&self) -> TransferGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        TransferGuard { context: self }
    }

    /// Returns whether every queue is empty and no transfer is in flight.
    ///
    /// A plain scan of queue sizes is not enough to decide "the pool is
    /// done": a task sitting in a balancer's hands between its pop and its
    /// push is invisible to such a scan, and a draining worker acting on it
    /// could exit while work remains. The check therefore brackets the scan
    /// with the transfer state: snapshot the completed-transfer epoch,
    /// require zero transfers in flight, scan the queues, then require the
    /// in-flight count still zero and the epoch unchanged. Any transfer that
    /// overlaps the scan flips one of the two.
    pub(crate) fn is_idle(&self) -> bool {
        let epoch = self.transfer_epoch.load(Ordering::SeqCst);
        if self.in_flight.load(Ordering::SeqCst) != 0 {
            return false;
        }
        if self.queues.iter().any(|queue| !queue.is_empty()) {
            return false;
        }
        self.in_flight.load(Ordering::SeqCst) == 0
            && self.transfer_epoch.load(Ordering::SeqCst) == epoch
    }
}

/// RAII marker for a task in transit between two queues.
pub(crate) struct TransferGuard<'a> {
    context: &'a PoolContext,
}

impl Drop for TransferGuard<'_> {
    fn drop(&mut self) {
        // Epoch first: an idle scan that misses the in-flight window must
        // still see the completed-transfer count move.
        self.context.transfer_epoch.fetch_add(1, Ordering::SeqCst);
        self.context.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnTask;
    use std::sync::Arc;

    #[test]
    fn empty_pool_is_idle() {
        let context = PoolContext::new(4, 1, 1);
        assert!(context.is_idle());
    }

    #[test]
    fn queued_task_keeps_pool_busy() {
        let context = PoolContext::new(2, 1, 1);
        context.queue(1).push_bottom(Arc::new(FnTask::new(|| {})));
        assert!(!context.is_idle());

        context.queue(1).pop_top();
        assert!(context.is_idle());
    }

    #[test]
    fn in_flight_transfer_keeps_pool_busy() {
        let context = PoolContext::new(2, 1, 1);
        let guard = context.begin_transfer();
        assert!(!context.is_idle());

        drop(guard);
        assert!(context.is_idle());
    }
}
