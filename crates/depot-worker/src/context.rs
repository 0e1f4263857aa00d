use async_trait::async_trait;
use depot_core::models::{Job, JobOutput};
use depot_core::JobError;
use std::sync::Arc;

/// Executes jobs on behalf of the worker pool.
///
/// The pool only holds a weak reference to its context, so the owner of the
/// pipeline state decides its lifetime.
#[async_trait]
pub trait JobHandlerContext: Send + Sync {
    /// Run one job. Follow-on jobs returned in the output are enqueued by the dispatcher.
    async fn dispatch_job(self: Arc<Self>, job: &Job) -> Result<JobOutput, JobError>;
}
