mod characterize_handler;
mod derivative_handler;

pub use characterize_handler::CharacterizeJobHandler;
pub use derivative_handler::DerivativeJobHandler;

use async_trait::async_trait;
use std::sync::Arc;

use depot_core::models::{Job, JobOutput};
use depot_core::JobError;

use crate::pipeline::Pipeline;

/// Trait for job handlers.
///
/// Handlers take the object lock for the steps that mutate the object and
/// release it before any slow work that only reads content.
#[async_trait]
pub trait JobHandler {
    async fn process(&self, job: &Job, pipeline: Arc<Pipeline>) -> Result<JobOutput, JobError>;
}
