use crate::{
    Error, ExecutorService, Result, SequentialExecutor, WorkBalancingPool, WorkStealingPool,
};
use core::fmt;
use core::str::FromStr;

/// Which scheduling strategy a pool should run.
///
/// Parses from the same short mode strings the surrounding tooling passes
/// through: `"s"`, `"ws"`, and `"wb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run every task inline on the submitting thread.
    Sequential,
    /// Idle workers pull tasks from randomly sampled victims.
    WorkStealing,
    /// Workers probabilistically even out pairwise queue sizes.
    WorkBalancing,
}

impl FromStr for ExecutionMode {
    type Err = Error;

    fn from_str(mode: &str) -> Result<Self> {
        match mode {
            "s" => Ok(Self::Sequential),
            "ws" => Ok(Self::WorkStealing),
            "wb" => Ok(Self::WorkBalancing),
            other => Err(Error::UnrecognizedMode(other.to_string())),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            Self::Sequential => "s",
            Self::WorkStealing => "ws",
            Self::WorkBalancing => "wb",
        };
        f.write_str(mode)
    }
}

/// Construction parameters for [`build_executor`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// The scheduling strategy.
    pub mode: ExecutionMode,
    /// Number of concurrent workers (and queues). Must be positive for the
    /// concurrent strategies; ignored by [`ExecutionMode::Sequential`].
    pub capacity: usize,
    /// Advisory per-batch claim threshold for work stealing; accepted but
    /// not required to affect scheduling.
    pub claim_threshold: usize,
    /// Balance threshold λ for work balancing: the minimum pairwise size gap
    /// before a transfer fires. Must be positive.
    pub balance_threshold: usize,
}

/// Builds the executor service selected by `config.mode`.
///
/// This is the selection boundary: misconfiguration is reported here,
/// immediately, and never recovered from.
///
/// # Errors
///
/// - [`Error::InvalidCapacity`] for a zero capacity (concurrent modes).
/// - [`Error::InvalidBalanceThreshold`] for a zero λ (work balancing).
/// - [`Error::Spawn`] if a worker thread cannot be spawned.
///
/// # Example
///
/// ```
/// use taskpool::{ExecutionMode, ExecutorService, PoolConfig, build_executor};
///
/// let mut executor = build_executor(&PoolConfig {
///     mode: "ws".parse::<ExecutionMode>()?,
///     capacity: 4,
///     claim_threshold: 1,
///     balance_threshold: 1,
/// })?;
///
/// executor.shutdown();
/// # Ok::<(), taskpool::Error>(())
/// ```
pub fn build_executor(config: &PoolConfig) -> Result<Box<dyn ExecutorService>> {
    match config.mode {
        ExecutionMode::Sequential => Ok(Box::new(SequentialExecutor::new())),
        ExecutionMode::WorkStealing => Ok(Box::new(WorkStealingPool::try_new(
            config.capacity,
            config.claim_threshold,
        )?)),
        ExecutionMode::WorkBalancing => Ok(Box::new(WorkBalancingPool::try_new(
            config.capacity,
            config.balance_threshold,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!("s".parse::<ExecutionMode>().unwrap(), ExecutionMode::Sequential);
        assert_eq!("ws".parse::<ExecutionMode>().unwrap(), ExecutionMode::WorkStealing);
        assert_eq!("wb".parse::<ExecutionMode>().unwrap(), ExecutionMode::WorkBalancing);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "roundrobin".parse::<ExecutionMode>().unwrap_err();
        assert!(matches!(err, Error::UnrecognizedMode(mode) if mode == "roundrobin"));
    }

    #[test]
    fn display_round_trips() {
        for mode in [
            ExecutionMode::Sequential,
            ExecutionMode::WorkStealing,
            ExecutionMode::WorkBalancing,
        ] {
            assert_eq!(mode.to_string().parse::<ExecutionMode>().unwrap(), mode);
        }
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = build_executor(&PoolConfig {
            mode: ExecutionMode::WorkStealing,
            capacity: 0,
            claim_threshold: 1,
            balance_threshold: 1,
        })
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, Error::InvalidCapacity(0)));
    }

    #[test]
    fn rejects_zero_balance_threshold() {
        let err = build_executor(&PoolConfig {
            mode: ExecutionMode::WorkBalancing,
            capacity: 2,
            claim_threshold: 1,
            balance_threshold: 0,
        })
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, Error::InvalidBalanceThreshold(0)));
    }
}
