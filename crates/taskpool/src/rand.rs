/// A source of uniformly distributed random indices.
///
/// This abstraction lets the engine draw victim and peer ids from a real
/// random source in production and from a scripted source in tests, where
/// redistribution decisions need to be reproduced exactly.
///
/// # Example
///
/// ```
/// use taskpool::RandSource;
///
/// struct Fixed(usize);
/// impl RandSource for Fixed {
///     fn rand_below(&mut self, bound: usize) -> usize {
///         self.0 % bound
///     }
/// }
///
/// let mut rng = Fixed(7);
/// assert_eq!(rng.rand_below(4), 3);
/// ```
pub trait RandSource {
    /// Returns a uniformly distributed integer in `[0, bound)`.
    ///
    /// # Panics
    ///
    /// Implementations may panic when `bound` is zero; the engine never
    /// draws from an empty range.
    fn rand_below(&mut self, bound: usize) -> usize;
}
