/// A result type defaulting to the crate-wide [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All possible errors that `taskpool` can produce.
///
/// Every variant is a configuration or construction failure: once a pool is
/// running, the engine has no fallible operations. A submission to a
/// shut-down service is signaled in-band through
/// [`SubmitStatus::Rejected`](crate::SubmitStatus::Rejected) rather than
/// through this type, because it is an expected outcome, not a fault.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested pool capacity was zero.
    ///
    /// A pool always owns at least one worker and one queue.
    #[error("pool capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    /// The work-balancing threshold was zero.
    ///
    /// A zero threshold would make the pairwise transfer loop run until the
    /// larger queue drains completely and then reverse direction on the next
    /// size read, so it is rejected at construction.
    #[error("balance threshold must be at least 1, got {0}")]
    InvalidBalanceThreshold(usize),

    /// A scheduling mode string was not one of `"s"`, `"ws"`, or `"wb"`.
    #[error("unrecognized scheduling mode `{0}`")]
    UnrecognizedMode(String),

    /// The operating system refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
