//! Depot Worker Library
//!
//! Deferred job execution: a laned in-process queue, per-object locks and a
//! bounded worker pool that dispatches jobs through a [`JobHandlerContext`].

pub mod context;
pub mod locks;
pub mod pool;
pub mod queue;

pub use context::JobHandlerContext;
pub use locks::{ObjectGuard, ObjectLocks};
pub use pool::{Dispatcher, JobReportSender, WorkerPool, WorkerPoolConfig};
pub use queue::{JobQueue, LaneRouting, QueueError};
