//! Version history import

use std::sync::Arc;

use bytes::Bytes;
use depot_core::digest;
use depot_core::models::{
    ChecksumAlgorithm, FixityEntry, ObjectId, RemoteCredentials, Version, VersionDescriptor,
    VersionRef,
};
use depot_core::{ImportSettings, PipelineError, PipelineResult};
use depot_storage::{ContentStore, FixityLogStore};
use depot_worker::ObjectLocks;
use serde::Serialize;
use uuid::Uuid;

use crate::credentials::resolve_credentials;
use crate::fetch::{FetchError, RemoteFetcher};

/// Outcome of a completed import
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub object_id: ObjectId,
    /// Written versions, in descriptor order
    pub versions: Vec<Version>,
    pub current: VersionRef,
    /// Versions whose stored bytes did not match the fetched bytes
    pub fixity_failures: usize,
    /// Characterization job admitted for the new current content
    pub characterization_job: Option<Uuid>,
}

/// Fetches remote versions and replays them into the content store.
///
/// Fetches run without holding the object lock; each store write takes it.
/// A failed fetch stops the import and leaves already-written versions in
/// place, so the caller can re-run the remaining descriptors.
pub struct VersionImporter {
    store: Arc<dyn ContentStore>,
    fixity_log: Arc<dyn FixityLogStore>,
    fetcher: Arc<dyn RemoteFetcher>,
    locks: ObjectLocks,
    settings: ImportSettings,
    algorithm: ChecksumAlgorithm,
}

impl VersionImporter {
    pub fn new(
        store: Arc<dyn ContentStore>,
        fixity_log: Arc<dyn FixityLogStore>,
        fetcher: Arc<dyn RemoteFetcher>,
        locks: ObjectLocks,
        settings: ImportSettings,
        algorithm: ChecksumAlgorithm,
    ) -> Self {
        Self {
            store,
            fixity_log,
            fetcher,
            locks,
            settings,
            algorithm,
        }
    }

    #[tracing::instrument(
        skip(self, descriptors, credentials),
        fields(object_id = %object_id, descriptors = descriptors.len())
    )]
    pub async fn import_versions(
        &self,
        object_id: &ObjectId,
        descriptors: &[VersionDescriptor],
        credentials: Option<&RemoteCredentials>,
    ) -> PipelineResult<ImportReport> {
        let credentials = resolve_credentials(credentials, &self.settings)?;
        if descriptors.is_empty() {
            return Err(PipelineError::InvalidInput(format!(
                "No version descriptors given for object {}",
                object_id
            )));
        }

        {
            let _guard = self.locks.lock(object_id).await;
            self.store.ensure_object(object_id, None).await?;
        }

        let start = std::time::Instant::now();
        let mut versions = Vec::with_capacity(descriptors.len());
        let mut fixity_failures = 0;

        for (index, descriptor) in descriptors.iter().enumerate() {
            let content = self
                .fetch(object_id, index, descriptor, &credentials)
                .await?;
            let fetched = digest(self.algorithm, &content);

            let (version, stored) = {
                let _guard = self.locks.lock(object_id).await;
                let version = self
                    .store
                    .put_version(object_id, content, descriptor.created, &descriptor.label)
                    .await?;
                let (_, stored) = self.store.get_version(object_id, version.version_ref).await?;
                (version, stored)
            };

            // Compare against the bytes read back from the store, not the buffer we wrote.
            let actual = digest(fetched.algorithm, &stored);
            let entry = FixityEntry::compare(
                object_id.clone(),
                Some(version.version_ref),
                fetched,
                actual,
            );
            let passed = entry.outcome.passed();
            let (expected, actual) = (entry.expected.clone(), entry.actual.clone());
            self.fixity_log.append(entry).await?;

            if !passed {
                fixity_failures += 1;
                tracing::warn!(
                    index = index,
                    label = %descriptor.label,
                    version_ref = %version.version_ref,
                    expected = %expected,
                    actual = %actual,
                    "Stored version does not match fetched bytes"
                );
                if self.settings.abort_on_checksum_mismatch {
                    return Err(PipelineError::ChecksumMismatch {
                        object_id: object_id.clone(),
                        version_ref: version.version_ref,
                        expected,
                        actual,
                    });
                }
            }

            tracing::info!(
                index = index,
                label = %descriptor.label,
                version_ref = %version.version_ref,
                created_at = %version.created_at,
                "Imported version"
            );
            versions.push(version);
        }

        let last = versions
            .last()
            .map(|v| v.version_ref)
            .ok_or_else(|| PipelineError::Internal("Import wrote no versions".to_string()))?;
        let object = {
            let _guard = self.locks.lock(object_id).await;
            self.store.set_current(object_id, last).await?
        };
        let current = object.current_version.unwrap_or(last);

        tracing::info!(
            versions = versions.len(),
            current = %current,
            fixity_failures = fixity_failures,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Import completed"
        );

        Ok(ImportReport {
            object_id: object_id.clone(),
            versions,
            current,
            fixity_failures,
            characterization_job: None,
        })
    }

    async fn fetch(
        &self,
        object_id: &ObjectId,
        index: usize,
        descriptor: &VersionDescriptor,
        credentials: &RemoteCredentials,
    ) -> PipelineResult<Bytes> {
        let timeout = self.settings.fetch_timeout;
        let result =
            match tokio::time::timeout(timeout, self.fetcher.fetch(&descriptor.uri, credentials))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(timeout)),
            };

        result.map_err(|e| {
            tracing::error!(
                index = index,
                label = %descriptor.label,
                uri = %descriptor.uri,
                error = %e,
                "Fetch failed, aborting import"
            );
            PipelineError::Fetch {
                object_id: object_id.clone(),
                index,
                label: descriptor.label.clone(),
                uri: descriptor.uri.clone(),
                source: e.into(),
            }
        })
    }
}
