use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use depot_core::models::{Job, JobOutput};
use depot_core::{JobError, PipelineError};
use depot_processing::derivative_jobs;

use super::JobHandler;
use crate::pipeline::Pipeline;

/// Extracts technical metadata, records a fixity check of the current content
/// and returns the derivative jobs for the resulting content kind.
pub struct CharacterizeJobHandler;

#[async_trait]
impl JobHandler for CharacterizeJobHandler {
    #[tracing::instrument(skip(self, job, pipeline), fields(job.id = %job.id, object_id = %job.object_id))]
    async fn process(&self, job: &Job, pipeline: Arc<Pipeline>) -> Result<JobOutput, JobError> {
        let _guard = pipeline.locks.lock(&job.object_id).await;

        let (object, content) = pipeline
            .store
            .get(&job.object_id)
            .await
            .map_err(PipelineError::from)?;

        let metadata = pipeline
            .characterizer
            .characterize(&content, object.declared_mime.as_deref())
            .await;
        let kind = metadata.content_kind();

        if let Some(expected) = &object.checksum {
            if let Err(e) = pipeline
                .fixity
                .record(&object.id, object.current_version, expected, &content)
                .await
            {
                tracing::warn!(error = %e, "Could not record fixity check");
            }
        }

        let detail = json!({
            "mime_type": metadata.mime_type,
            "content_kind": kind,
            "size_bytes": metadata.size_bytes,
            "version": object.current_version.map(|v| v.to_string()),
        });

        pipeline
            .store
            .update_metadata(&job.object_id, metadata)
            .await
            .map_err(PipelineError::from)?;

        let follow_ups = derivative_jobs(kind);
        tracing::info!(
            content_kind = %kind,
            follow_ups = follow_ups.len(),
            "Characterization completed"
        );

        Ok(JobOutput { follow_ups, detail })
    }
}
