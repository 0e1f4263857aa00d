//! Job queue: ordered lanes of pending work.
//!
//! Jobs are FIFO within a lane. The default lane is served before the low
//! lane; under [`LanePolicy::FairShare`] the low lane is guaranteed one slot
//! after every `ratio` consecutive default-lane jobs taken while it was waiting.
//!
//! The queue is an explicit object. Nothing about it is global, so several
//! queues (for instance one per test) can coexist.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use depot_core::models::{Job, JobKind, Lane, LanePolicy, ObjectId};
use depot_core::PipelineError;
use thiserror::Error;
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Job queue is closed")]
    Closed,
}

impl From<QueueError> for PipelineError {
    fn from(err: QueueError) -> Self {
        PipelineError::Internal(err.to_string())
    }
}

/// Maps job kinds to lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneRouting {
    /// Lane for characterization. Derivative jobs always use the default lane.
    pub characterize: Lane,
}

impl Default for LaneRouting {
    fn default() -> Self {
        Self {
            characterize: Lane::Low,
        }
    }
}

impl LaneRouting {
    pub fn lane_for(&self, kind: JobKind) -> Lane {
        match kind {
            JobKind::Characterize => self.characterize,
            JobKind::GenerateThumbnail | JobKind::TranscodeAudio | JobKind::TranscodeVideo => {
                Lane::Default
            }
        }
    }
}

#[derive(Default)]
struct QueueState {
    default_lane: VecDeque<Job>,
    low_lane: VecDeque<Job>,
    /// Default-lane jobs taken in a row while low-lane work was waiting
    default_streak: u32,
    closed: bool,
}

impl QueueState {
    fn lane_mut(&mut self, lane: Lane) -> &mut VecDeque<Job> {
        match lane {
            Lane::Default => &mut self.default_lane,
            Lane::Low => &mut self.low_lane,
        }
    }

    fn select_lane(&mut self, policy: LanePolicy) -> Option<Lane> {
        match (self.default_lane.is_empty(), self.low_lane.is_empty()) {
            (true, true) => None,
            (false, true) => {
                self.default_streak = 0;
                Some(Lane::Default)
            }
            (true, false) => {
                self.default_streak = 0;
                Some(Lane::Low)
            }
            (false, false) => match policy {
                LanePolicy::Strict => Some(Lane::Default),
                LanePolicy::FairShare { ratio } => {
                    if self.default_streak >= ratio {
                        self.default_streak = 0;
                        Some(Lane::Low)
                    } else {
                        self.default_streak += 1;
                        Some(Lane::Default)
                    }
                }
            },
        }
    }
}

pub struct JobQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    policy: LanePolicy,
    routing: LaneRouting,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new(LanePolicy::default(), LaneRouting::default())
    }
}

impl JobQueue {
    pub fn new(policy: LanePolicy, routing: LaneRouting) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            policy,
            routing,
        }
    }

    pub fn policy(&self) -> LanePolicy {
        self.policy
    }

    pub fn routing(&self) -> LaneRouting {
        self.routing
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        // Queue state stays consistent across a panic: every mutation is a single push/pop.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Admit a new job for `object_id` into the lane its kind routes to.
    #[tracing::instrument(skip(self), fields(object_id = %object_id))]
    pub fn enqueue(&self, kind: JobKind, object_id: ObjectId) -> Result<Job, QueueError> {
        let job = Job::new(kind, object_id, self.routing.lane_for(kind));
        self.push(job.clone())?;
        tracing::info!(
            job.id = %job.id,
            job.kind = %job.kind,
            lane = %job.lane,
            "Job enqueued"
        );
        Ok(job)
    }

    /// Append an existing job to the back of its own lane. Used for retries.
    pub fn requeue(&self, job: Job) -> Result<(), QueueError> {
        tracing::debug!(job.id = %job.id, attempt = job.attempt, lane = %job.lane, "Job re-enqueued");
        self.push(job)
    }

    fn push(&self, job: Job) -> Result<(), QueueError> {
        {
            let mut state = self.state();
            if state.closed {
                return Err(QueueError::Closed);
            }
            state.lane_mut(job.lane).push_back(job);
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Remove the next job according to the lane policy, if any.
    pub fn try_dequeue(&self) -> Option<Job> {
        let mut state = self.state();
        let lane = state.select_lane(self.policy)?;
        state.lane_mut(lane).pop_front()
    }

    /// Wait for the next job. Returns `None` once the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<Job> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(job) = self.try_dequeue() {
                return Some(job);
            }
            if self.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    /// Remove a pending job. Running jobs are not affected.
    pub fn cancel(&self, job_id: Uuid) -> Option<Job> {
        let mut state = self.state();
        for lane in Lane::ALL {
            let jobs = state.lane_mut(lane);
            if let Some(pos) = jobs.iter().position(|j| j.id == job_id) {
                let job = jobs.remove(pos);
                if let Some(job) = &job {
                    tracing::info!(job.id = %job.id, job.kind = %job.kind, "Job cancelled");
                }
                return job;
            }
        }
        None
    }

    /// Stop admitting jobs and wake every waiting dequeuer. Pending jobs can still be taken.
    pub fn close(&self) {
        self.state().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn len(&self) -> usize {
        let state = self.state();
        state.default_lane.len() + state.low_lane.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lane_len(&self, lane: Lane) -> usize {
        self.state().lane_mut(lane).len()
    }
}
