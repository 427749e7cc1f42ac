//! 线程亲和执行桥

pub mod affinity;
pub mod context;
pub mod error;
pub mod executor;
pub mod test_mode;
pub mod worker_pool;

pub use affinity::{AffinityDispatcher, DispatcherStats, Handoff};
pub use context::{AffinityHandle, ExecutionContext, ExecutionState};
pub use error::{BridgeError, BridgeResult, ErrorSeverity};
pub use executor::ExecutionBridge;
pub use test_mode::{is_force_affine, set_force_affine, ForceAffineGuard};
pub use worker_pool::{Job, WorkerPool, WorkerPoolConfig, WorkerPoolStats};
