use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use depot_core::models::{Job, JobOutput};
use depot_core::{JobError, PipelineError};

use super::JobHandler;
use crate::pipeline::Pipeline;

/// Produces thumbnails and transcodes from the object's current content.
///
/// Generation runs without the object lock. The outputs are written only if
/// the current version is still the one that was read; otherwise a newer
/// characterization has already queued fresh derivative jobs.
pub struct DerivativeJobHandler;

#[async_trait]
impl JobHandler for DerivativeJobHandler {
    #[tracing::instrument(
        skip(self, job, pipeline),
        fields(job.id = %job.id, job.kind = %job.kind, object_id = %job.object_id)
    )]
    async fn process(&self, job: &Job, pipeline: Arc<Pipeline>) -> Result<JobOutput, JobError> {
        let (object, content) = {
            let _guard = pipeline.locks.lock(&job.object_id).await;
            pipeline
                .store
                .get(&job.object_id)
                .await
                .map_err(PipelineError::from)?
        };

        let kind = object.content_kind().ok_or_else(|| {
            JobError::unrecoverable(anyhow!(
                "Object {} has not been characterized",
                job.object_id
            ))
        })?;

        let derivatives = pipeline
            .generator
            .generate(job.kind, kind, &content)
            .await
            .map_err(|e| {
                if e.is_recoverable() {
                    JobError::recoverable(e)
                } else {
                    JobError::unrecoverable(e)
                }
            })?;

        let _guard = pipeline.locks.lock(&job.object_id).await;
        let latest = pipeline
            .store
            .get_object(&job.object_id)
            .await
            .map_err(PipelineError::from)?;
        if latest.current_version != object.current_version {
            tracing::warn!(
                read_version = ?object.current_version,
                current_version = ?latest.current_version,
                "Content changed during generation, discarding derivatives"
            );
            return Ok(JobOutput::with_detail(json!({ "discarded": derivatives.len() })));
        }

        let mut names = Vec::with_capacity(derivatives.len());
        for derivative in derivatives {
            pipeline
                .store
                .put_derivative(&job.object_id, &derivative.name, derivative.content)
                .await
                .map_err(PipelineError::from)?;
            names.push(derivative.name);
        }

        tracing::info!(derivatives = ?names, "Derivatives stored");
        Ok(JobOutput::with_detail(json!({ "derivatives": names })))
    }
}
