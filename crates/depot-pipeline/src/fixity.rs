//! Checksum verification and the fixity audit trail

use std::sync::Arc;

use depot_core::digest;
use depot_core::models::{
    Checksum, ChecksumAlgorithm, FixityEntry, FixityOutcome, ObjectId, VersionRef,
};
use depot_core::PipelineResult;
use depot_storage::{ContentStore, FixityLogStore};

/// Digests content and records every comparison in the per-object audit log.
///
/// A failed comparison is recorded, not raised. Callers that want to gate on
/// fixity inspect the returned entry.
#[derive(Clone)]
pub struct FixityService {
    store: Arc<dyn ContentStore>,
    log: Arc<dyn FixityLogStore>,
    algorithm: ChecksumAlgorithm,
}

impl FixityService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        log: Arc<dyn FixityLogStore>,
        algorithm: ChecksumAlgorithm,
    ) -> Self {
        Self {
            store,
            log,
            algorithm,
        }
    }

    pub fn digest(&self, content: &[u8]) -> Checksum {
        digest(self.algorithm, content)
    }

    /// Compare `content` against `expected` and append the outcome.
    ///
    /// The content is digested with the expected checksum's algorithm.
    pub async fn record(
        &self,
        object_id: &ObjectId,
        version_ref: Option<VersionRef>,
        expected: &Checksum,
        content: &[u8],
    ) -> PipelineResult<FixityEntry> {
        let actual = digest(expected.algorithm, content);
        let entry = FixityEntry::compare(object_id.clone(), version_ref, expected.clone(), actual);

        if entry.outcome.passed() {
            tracing::debug!(object_id = %object_id, checksum = %entry.actual, "Fixity check passed");
        } else {
            tracing::warn!(
                object_id = %object_id,
                version_ref = ?version_ref,
                expected = %entry.expected,
                actual = %entry.actual,
                "Fixity check failed"
            );
        }

        self.log.append(entry.clone()).await?;
        Ok(entry)
    }

    /// Verify the current content of an object against `expected`.
    #[tracing::instrument(skip(self, expected), fields(object_id = %object_id))]
    pub async fn verify(&self, object_id: &ObjectId, expected: &Checksum) -> PipelineResult<FixityOutcome> {
        let (object, content) = self.store.get(object_id).await?;
        let entry = self
            .record(object_id, object.current_version, expected, &content)
            .await?;
        Ok(entry.outcome)
    }

    /// Re-digest every stored version and compare it with the checksum recorded at write time.
    #[tracing::instrument(skip(self), fields(object_id = %object_id))]
    pub async fn audit(&self, object_id: &ObjectId) -> PipelineResult<Vec<FixityEntry>> {
        let versions = self.store.list_versions(object_id).await?;
        let mut entries = Vec::with_capacity(versions.len());
        for version in versions {
            let (version, content) = self.store.get_version(object_id, version.version_ref).await?;
            entries.push(
                self.record(object_id, Some(version.version_ref), &version.checksum, &content)
                    .await?,
            );
        }

        let failed = entries.iter().filter(|e| !e.outcome.passed()).count();
        tracing::info!(versions = entries.len(), failed = failed, "Fixity audit completed");
        Ok(entries)
    }

    /// Audit history in check order
    pub async fn entries(&self, object_id: &ObjectId) -> PipelineResult<Vec<FixityEntry>> {
        Ok(self.log.entries(object_id).await?)
    }
}
