mod balancing;
mod context;
mod interface;
mod sequential;
mod stealing;

pub(crate) use context::PoolContext;

pub use balancing::WorkBalancingPool;
pub use interface::ExecutorService;
pub use sequential::SequentialExecutor;
pub use stealing::WorkStealingPool;
