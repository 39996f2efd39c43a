use crate::RandSource;
use rand::Rng;

/// A [`RandSource`] backed by the thread-local RNG (`rand::rng()`).
///
/// Each OS thread has its own generator, so draws from multiple workers are
/// contention-free. This type does not store the RNG itself; it is a
/// zero-sized wrapper that accesses the thread-local generator on each call,
/// which also means each worker thread ends up with a private random stream
/// no matter how the pool clones its configured source.
#[derive(Default, Clone, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn rand_below(&mut self, bound: usize) -> usize {
        rand::rng().random_range(0..bound)
    }
}
