//! Pipeline state and its public operations.

use std::sync::{Arc, Weak};

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use depot_core::constants::VERSION_LABEL_PREFIX;
use depot_core::models::{
    Checksum, FixityEntry, FixityOutcome, Job, JobKind, JobReport, ObjectId, RemoteCredentials,
    Version, VersionDescriptor,
};
use depot_core::{PipelineConfig, PipelineError, PipelineResult};
use depot_import::{HttpFetcher, ImportReport, RemoteFetcher, VersionImporter};
use depot_processing::{Characterizer, DerivativeGenerator, MediaDerivativeGenerator};
use depot_storage::{create_content_store, create_fixity_log, ContentStore, FixityLogStore};
use depot_worker::{
    Dispatcher, JobHandlerContext, JobQueue, JobReportSender, LaneRouting, ObjectLocks,
    WorkerPool, WorkerPoolConfig,
};

use crate::fixity::FixityService;

/// Swappable collaborators of a pipeline
pub struct PipelineComponents {
    pub store: Arc<dyn ContentStore>,
    pub fixity_log: Arc<dyn FixityLogStore>,
    pub fetcher: Arc<dyn RemoteFetcher>,
    pub generator: Arc<dyn DerivativeGenerator>,
    pub characterizer: Characterizer,
}

/// Result of a deposit
#[derive(Debug, Clone, Serialize)]
pub struct DepositOutcome {
    pub version: Version,
    /// Characterization job, absent when the content did not change
    pub job: Option<Job>,
}

pub struct Pipeline {
    pub store: Arc<dyn ContentStore>,
    pub fixity: FixityService,
    pub queue: Arc<JobQueue>,
    pub locks: ObjectLocks,
    pub characterizer: Characterizer,
    pub generator: Arc<dyn DerivativeGenerator>,
    pub importer: VersionImporter,
    pub config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, components: PipelineComponents) -> Arc<Self> {
        let queue = Arc::new(JobQueue::new(
            config.queue.lane_policy,
            LaneRouting {
                characterize: config.queue.characterize_lane,
            },
        ));
        let locks = ObjectLocks::new();
        let fixity = FixityService::new(
            components.store.clone(),
            components.fixity_log.clone(),
            config.checksum_algorithm,
        );
        let importer = VersionImporter::new(
            components.store.clone(),
            components.fixity_log,
            components.fetcher,
            locks.clone(),
            config.import.clone(),
            config.checksum_algorithm,
        );

        Arc::new(Self {
            store: components.store,
            fixity,
            queue,
            locks,
            characterizer: components.characterizer,
            generator: components.generator,
            importer,
            config,
        })
    }

    /// Build a pipeline with the configured store backend, HTTP fetcher and media tools.
    pub async fn from_config(config: PipelineConfig) -> PipelineResult<Arc<Self>> {
        let store = create_content_store(&config.storage, config.checksum_algorithm).await?;
        let fixity_log = create_fixity_log(&config.storage).await?;
        let fetcher = HttpFetcher::new(config.import.fetch_timeout)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;

        tracing::info!(
            backend = %store.backend_type(),
            max_workers = config.queue.max_workers,
            lane_policy = %config.queue.lane_policy,
            checksum_algorithm = %config.checksum_algorithm,
            "Pipeline initialized"
        );

        let components = PipelineComponents {
            store,
            fixity_log,
            fetcher: Arc::new(fetcher),
            generator: Arc::new(MediaDerivativeGenerator::from_settings(&config.processing)),
            characterizer: Characterizer::from_settings(&config.processing),
        };
        Ok(Self::new(config, components))
    }

    /// Store new content for an object and make it current.
    ///
    /// Characterization is enqueued only when the checksum differs from the
    /// previous current content.
    #[tracing::instrument(skip(self, content, declared_mime, label), fields(object_id = %object_id, size_bytes = content.len()))]
    pub async fn deposit(
        &self,
        object_id: &ObjectId,
        content: Bytes,
        declared_mime: Option<&str>,
        label: Option<&str>,
    ) -> PipelineResult<DepositOutcome> {
        let (version, changed) = {
            let _guard = self.locks.lock(object_id).await;
            let object = self.store.ensure_object(object_id, declared_mime).await?;
            let label = match label.map(str::trim).filter(|l| !l.is_empty()) {
                Some(label) => label.to_string(),
                None => {
                    let existing = self.store.list_versions(object_id).await?.len();
                    format!("{}{}", VERSION_LABEL_PREFIX, existing + 1)
                }
            };

            let version = self
                .store
                .put_version(object_id, content, Utc::now(), &label)
                .await?;
            self.store.set_current(object_id, version.version_ref).await?;
            let changed = object.checksum.as_ref() != Some(&version.checksum);
            (version, changed)
        };

        let job = if changed {
            Some(self.enqueue_characterization(object_id).await?)
        } else {
            tracing::info!(checksum = %version.checksum, "Content unchanged, characterization skipped");
            None
        };

        Ok(DepositOutcome { version, job })
    }

    /// Admit a characterization job for an existing object.
    pub async fn enqueue_characterization(&self, object_id: &ObjectId) -> PipelineResult<Job> {
        self.store.get_object(object_id).await?;
        Ok(self.queue.enqueue(JobKind::Characterize, object_id.clone())?)
    }

    /// Replay a legacy version history into `object_id` and characterize the result.
    pub async fn import_versions(
        &self,
        object_id: &ObjectId,
        descriptors: &[VersionDescriptor],
        credentials: Option<&RemoteCredentials>,
    ) -> PipelineResult<ImportReport> {
        let mut report = self
            .importer
            .import_versions(object_id, descriptors, credentials)
            .await?;
        let job = self.enqueue_characterization(object_id).await?;
        report.characterization_job = Some(job.id);
        Ok(report)
    }

    pub async fn versions(&self, object_id: &ObjectId) -> PipelineResult<Vec<Version>> {
        Ok(self.store.list_versions(object_id).await?)
    }

    pub async fn derivatives(&self, object_id: &ObjectId) -> PipelineResult<Vec<String>> {
        Ok(self.store.list_derivatives(object_id).await?)
    }

    pub async fn fixity_log(&self, object_id: &ObjectId) -> PipelineResult<Vec<FixityEntry>> {
        self.fixity.entries(object_id).await
    }

    pub async fn verify(&self, object_id: &ObjectId, expected: &Checksum) -> PipelineResult<FixityOutcome> {
        self.fixity.verify(object_id, expected).await
    }

    pub async fn audit(&self, object_id: &ObjectId) -> PipelineResult<Vec<FixityEntry>> {
        self.fixity.audit(object_id).await
    }

    /// Remove a pending job. Returns `None` if it already started or never existed.
    pub fn cancel_job(&self, job_id: Uuid) -> Option<Job> {
        self.queue.cancel(job_id)
    }

    pub fn dispatcher(self: &Arc<Self>) -> Dispatcher {
        let context: Weak<dyn JobHandlerContext> = Arc::downgrade(self) as Weak<dyn JobHandlerContext>;
        Dispatcher::new(
            self.queue.clone(),
            context,
            WorkerPoolConfig::from(&self.config.queue),
        )
    }

    /// Run queued jobs, and the jobs they produce, until the queue is empty.
    pub async fn run_pending(self: &Arc<Self>) -> Vec<JobReport> {
        self.dispatcher().run_until_idle().await
    }

    /// Start background workers. Reports are sent to `reports` when given.
    pub fn start_workers(self: &Arc<Self>, reports: Option<JobReportSender>) -> WorkerPool {
        let dispatcher = self.dispatcher();
        match reports {
            Some(sender) => dispatcher.with_reports(sender).spawn(),
            None => dispatcher.spawn(),
        }
    }
}
