use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use super::content::ObjectId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Characterize,
    GenerateThumbnail,
    TranscodeAudio,
    TranscodeVideo,
}

impl Display for JobKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobKind::Characterize => write!(f, "characterize"),
            JobKind::GenerateThumbnail => write!(f, "generate_thumbnail"),
            JobKind::TranscodeAudio => write!(f, "transcode_audio"),
            JobKind::TranscodeVideo => write!(f, "transcode_video"),
        }
    }
}

impl FromStr for JobKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "characterize" => Ok(JobKind::Characterize),
            "generate_thumbnail" => Ok(JobKind::GenerateThumbnail),
            "transcode_audio" => Ok(JobKind::TranscodeAudio),
            "transcode_video" => Ok(JobKind::TranscodeVideo),
            _ => Err(anyhow::anyhow!("Invalid job kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Queue lanes in service order: `Default` is always considered before `Low`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    #[default]
    Default,
    Low,
}

impl Lane {
    pub const ALL: [Lane; 2] = [Lane::Default, Lane::Low];
}

impl Display for Lane {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Lane::Default => write!(f, "default"),
            Lane::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Lane {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" | "normal" => Ok(Lane::Default),
            "low" => Ok(Lane::Low),
            _ => Err(anyhow::anyhow!("Invalid lane: {}", s)),
        }
    }
}

/// How the dispatcher chooses between lanes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LanePolicy {
    /// The low lane is served only when the default lane is empty.
    #[default]
    Strict,
    /// After `ratio` consecutive default-lane jobs taken while low-lane work was
    /// waiting, one low-lane job is taken.
    FairShare { ratio: u32 },
}

impl FromStr for LanePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized == "strict" {
            return Ok(LanePolicy::Strict);
        }
        if let Some(ratio) = normalized.strip_prefix("fair:") {
            let ratio: u32 = ratio
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid fair-share ratio: {}", ratio))?;
            if ratio == 0 {
                return Err(anyhow::anyhow!("Fair-share ratio must be at least 1"));
            }
            return Ok(LanePolicy::FairShare { ratio });
        }
        Err(anyhow::anyhow!(
            "Invalid lane policy: {} (expected 'strict' or 'fair:N')",
            s
        ))
    }
}

impl Display for LanePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LanePolicy::Strict => write!(f, "strict"),
            LanePolicy::FairShare { ratio } => write!(f, "fair:{}", ratio),
        }
    }
}

/// A unit of deferred work. Carries nothing beyond the target object id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub object_id: ObjectId,
    pub lane: Lane,
    /// Zero for the first execution, incremented on each retry.
    pub attempt: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(kind: JobKind, object_id: ObjectId, lane: Lane) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            object_id,
            lane,
            attempt: 0,
            enqueued_at: Utc::now(),
        }
    }

    pub fn can_retry(&self, max_retries: u32) -> bool {
        self.attempt < max_retries
    }

    /// The same job, re-admitted for another attempt.
    pub fn retried(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            enqueued_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// What a job handler hands back to the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct JobOutput {
    /// Follow-on jobs for the same object. The dispatcher enqueues these.
    pub follow_ups: Vec<JobKind>,
    pub detail: serde_json::Value,
}

impl JobOutput {
    pub fn with_detail(detail: serde_json::Value) -> Self {
        Self {
            follow_ups: Vec::new(),
            detail,
        }
    }
}

/// Final outcome of one job execution, surfaced to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: Job,
    pub status: JobStatus,
    pub error: Option<String>,
    /// Ids of follow-on jobs admitted as a result of this execution.
    pub follow_ups: Vec<Uuid>,
    /// Follow-on kinds that could not be admitted, e.g. because the queue closed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_follow_ups: Vec<JobKind>,
    /// Whether the job was re-admitted under the retry policy.
    pub retried: bool,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, JobStatus::Failed)
    }
}
