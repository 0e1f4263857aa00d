//! Dispatcher and worker pool.
//!
//! The dispatcher pulls jobs from a [`JobQueue`], runs them through a
//! [`JobHandlerContext`] with at most `max_workers` in flight, enqueues the
//! follow-on jobs they produce and applies the retry policy to failures.

use std::sync::{Arc, Weak};
use std::time::Instant;

use chrono::Utc;
use depot_core::models::{Job, JobReport, JobStatus};
use depot_core::{JobError, PipelineError, QueueSettings};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::context::JobHandlerContext;
use crate::queue::JobQueue;

/// Receives one report per job execution
pub type JobReportSender = mpsc::UnboundedSender<JobReport>;

#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub max_workers: usize,
    pub max_retries: u32,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::from(&QueueSettings::default())
    }
}

impl From<&QueueSettings> for WorkerPoolConfig {
    fn from(settings: &QueueSettings) -> Self {
        Self {
            max_workers: settings.max_workers.max(1),
            max_retries: settings.max_retries,
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<JobQueue>,
    context: Weak<dyn JobHandlerContext>,
    config: WorkerPoolConfig,
    reports: Option<JobReportSender>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<JobQueue>,
        context: Weak<dyn JobHandlerContext>,
        config: WorkerPoolConfig,
    ) -> Self {
        Self {
            queue,
            context,
            config,
            reports: None,
        }
    }

    /// Also send every report to `sender`
    pub fn with_reports(mut self, sender: JobReportSender) -> Self {
        self.reports = Some(sender);
        self
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Run a single job to completion and settle its outcome.
    #[tracing::instrument(
        skip(self, job),
        fields(
            job.id = %job.id,
            job.kind = %job.kind,
            object_id = %job.object_id,
            attempt = job.attempt
        )
    )]
    pub async fn execute(&self, job: Job) -> JobReport {
        let start = Instant::now();
        tracing::debug!("Processing job");

        let result = match self.context.upgrade() {
            Some(context) => context.dispatch_job(&job).await,
            None => Err(JobError::unrecoverable(anyhow::anyhow!(
                "Job handler context has been dropped"
            ))),
        };
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let report = match result {
            Ok(output) => {
                let mut follow_ups = Vec::with_capacity(output.follow_ups.len());
                let mut dropped_follow_ups = Vec::new();
                for kind in output.follow_ups {
                    match self.queue.enqueue(kind, job.object_id.clone()) {
                        Ok(follow_up) => follow_ups.push(follow_up.id),
                        Err(e) => {
                            tracing::error!(error = %e, follow_up = %kind, "Follow-up job dropped");
                            dropped_follow_ups.push(kind);
                        }
                    }
                }
                tracing::info!(
                    duration_ms = duration_ms,
                    follow_ups = follow_ups.len(),
                    dropped_follow_ups = dropped_follow_ups.len(),
                    "Job completed"
                );
                JobReport {
                    job,
                    status: JobStatus::Completed,
                    error: None,
                    follow_ups,
                    dropped_follow_ups,
                    retried: false,
                    finished_at: Utc::now(),
                }
            }
            Err(err) => {
                let recoverable = err.is_recoverable();
                let error = PipelineError::JobExecution {
                    job_id: job.id,
                    kind: job.kind,
                    object_id: job.object_id.clone(),
                    source: err.into_inner(),
                };
                let message = error.to_string();

                let retried = recoverable
                    && job.can_retry(self.config.max_retries)
                    && match self.queue.requeue(job.retried()) {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!(error = %e, "Could not re-enqueue job for retry");
                            false
                        }
                    };

                if retried {
                    tracing::warn!(
                        error = %message,
                        duration_ms = duration_ms,
                        max_retries = self.config.max_retries,
                        "Job failed, will retry"
                    );
                } else {
                    tracing::error!(
                        error = %message,
                        recoverable = recoverable,
                        duration_ms = duration_ms,
                        "Job failed"
                    );
                }

                JobReport {
                    job,
                    status: JobStatus::Failed,
                    error: Some(message),
                    follow_ups: Vec::new(),
                    dropped_follow_ups: Vec::new(),
                    retried,
                    finished_at: Utc::now(),
                }
            }
        };

        if let Some(sender) = &self.reports {
            let _ = sender.send(report.clone());
        }
        report
    }

    /// Drain the queue, including follow-ups and retries, and return every report.
    pub async fn run_until_idle(&self) -> Vec<JobReport> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut in_flight = JoinSet::new();
        let mut reports = Vec::new();

        loop {
            while let Ok(permit) = semaphore.clone().try_acquire_owned() {
                let Some(job) = self.queue.try_dequeue() else {
                    break;
                };
                let dispatcher = self.clone();
                in_flight.spawn(async move {
                    let _permit = permit;
                    dispatcher.execute(job).await
                });
            }

            match in_flight.join_next().await {
                Some(Ok(report)) => reports.push(report),
                Some(Err(e)) => log_join_error(e),
                None => break,
            }
        }

        reports
    }

    /// Start a long-running worker pool in the background.
    pub fn spawn(self) -> WorkerPool {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let handle = tokio::spawn(self.run(shutdown_rx));
        WorkerPool {
            shutdown_tx,
            handle,
        }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(
            max_workers = self.config.max_workers,
            max_retries = self.config.max_retries,
            lane_policy = %self.queue.policy(),
            "Worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut in_flight: JoinSet<JobReport> = JoinSet::new();

        loop {
            let permit = tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Worker pool shutting down");
                    break;
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        log_join_error(e);
                    }
                    continue;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let job = tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Worker pool shutting down");
                    break;
                }
                job = self.queue.dequeue() => match job {
                    Some(job) => job,
                    None => {
                        tracing::info!("Job queue closed and drained");
                        break;
                    }
                },
            };

            let dispatcher = self.clone();
            in_flight.spawn(async move {
                let _permit = permit;
                dispatcher.execute(job).await
            });
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                log_join_error(e);
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

fn log_join_error(e: JoinError) {
    tracing::error!(error = %e, "Job task panicked or was aborted");
}

/// Handle to a running worker pool
pub struct WorkerPool {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl WorkerPool {
    /// Stop claiming jobs and wait for in-flight jobs to finish. Pending jobs stay queued.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Worker pool task failed");
        }
    }

    /// Wait for the pool to stop on its own, which happens once its queue is closed and drained.
    pub async fn join(self) {
        let WorkerPool {
            shutdown_tx: _keep_open,
            handle,
        } = self;
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Worker pool task failed");
        }
    }
}
