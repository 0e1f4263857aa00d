//! JobHandlerContext implementation for Pipeline.
//!
//! Dispatches jobs to the appropriate handler based on job kind.

use async_trait::async_trait;
use std::sync::Arc;

use depot_core::models::{Job, JobKind, JobOutput};
use depot_core::JobError;
use depot_worker::JobHandlerContext;

use crate::job_handlers::{CharacterizeJobHandler, DerivativeJobHandler, JobHandler};
use crate::pipeline::Pipeline;

#[async_trait]
impl JobHandlerContext for Pipeline {
    async fn dispatch_job(self: Arc<Self>, job: &Job) -> Result<JobOutput, JobError> {
        match job.kind {
            JobKind::Characterize => CharacterizeJobHandler.process(job, self).await,
            JobKind::GenerateThumbnail | JobKind::TranscodeAudio | JobKind::TranscodeVideo => {
                DerivativeJobHandler.process(job, self).await
            }
        }
    }
}
