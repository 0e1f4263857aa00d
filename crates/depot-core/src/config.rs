//! Configuration module
//!
//! Pipeline settings are read from the environment (optionally seeded from a
//! `.env` file) with defaults for everything except the legacy repository
//! credentials, which are only required when an import runs.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_THUMBNAIL_SIZE};
use crate::models::{ChecksumAlgorithm, Lane, LanePolicy, RemoteCredentials};
use crate::storage_types::StorageBackend;

const DEFAULT_MAX_WORKERS: usize = 4;
const DEFAULT_STORAGE_PATH: &str = "./depot-data";

/// Content store selection
#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

/// Job queue and worker pool settings
#[derive(Clone, Debug)]
pub struct QueueSettings {
    pub max_workers: usize,
    /// Extra attempts allowed for a recoverable job failure. 0 disables retries.
    pub max_retries: u32,
    pub lane_policy: LanePolicy,
    pub characterize_lane: Lane,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            max_retries: 0,
            lane_policy: LanePolicy::Strict,
            characterize_lane: Lane::Low,
        }
    }
}

/// Legacy repository import settings
#[derive(Clone, Debug)]
pub struct ImportSettings {
    pub credentials: Option<RemoteCredentials>,
    pub fetch_timeout: Duration,
    pub abort_on_checksum_mismatch: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            credentials: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            abort_on_checksum_mismatch: false,
        }
    }
}

/// External tools and characterization options
#[derive(Clone, Debug)]
pub struct ProcessingSettings {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub pdftoppm_path: String,
    /// Run ffprobe on audio/video during characterization
    pub probe_media: bool,
    pub thumbnail_size: u32,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            probe_media: false,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub storage: StorageSettings,
    pub queue: QueueSettings,
    pub import: ImportSettings,
    pub processing: ProcessingSettings,
    pub checksum_algorithm: ChecksumAlgorithm,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage: StorageSettings {
                backend: StorageBackend::Memory,
                path: PathBuf::from(DEFAULT_STORAGE_PATH),
            },
            queue: QueueSettings::default(),
            import: ImportSettings::default(),
            processing: ProcessingSettings::default(),
            checksum_algorithm: ChecksumAlgorithm::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Numeric and boolean values that fail to parse fall back to their
    /// defaults. Enumerated values (backend, lane, policy, algorithm) that fail
    /// to parse are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PipelineConfig::default();

        let backend = match lookup("DEPOT_STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.storage.backend,
        };

        let credentials = match (
            lookup("LEGACY_REPOSITORY_USER"),
            lookup("LEGACY_REPOSITORY_PASSWORD"),
        ) {
            (Some(user), Some(password)) => {
                Some(RemoteCredentials::new(user, password)).filter(|c| c.is_complete())
            }
            _ => None,
        };

        let config = PipelineConfig {
            storage: StorageSettings {
                backend,
                path: lookup("DEPOT_STORAGE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.path),
            },
            queue: QueueSettings {
                max_workers: lookup("DEPOT_MAX_WORKERS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.queue.max_workers),
                max_retries: lookup("DEPOT_MAX_RETRIES")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.queue.max_retries),
                lane_policy: match lookup("DEPOT_LANE_POLICY") {
                    Some(value) => value.parse()?,
                    None => defaults.queue.lane_policy,
                },
                characterize_lane: match lookup("DEPOT_CHARACTERIZE_LANE") {
                    Some(value) => value.parse()?,
                    None => defaults.queue.characterize_lane,
                },
            },
            import: ImportSettings {
                credentials,
                fetch_timeout: Duration::from_secs(
                    lookup("DEPOT_FETCH_TIMEOUT_SECS")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
                ),
                abort_on_checksum_mismatch: lookup("DEPOT_ABORT_ON_CHECKSUM_MISMATCH")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.import.abort_on_checksum_mismatch),
            },
            processing: ProcessingSettings {
                ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or(defaults.processing.ffmpeg_path),
                ffprobe_path: lookup("FFPROBE_PATH").unwrap_or(defaults.processing.ffprobe_path),
                pdftoppm_path: lookup("PDFTOPPM_PATH")
                    .unwrap_or(defaults.processing.pdftoppm_path),
                probe_media: lookup("DEPOT_PROBE_MEDIA")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.processing.probe_media),
                thumbnail_size: lookup("DEPOT_THUMBNAIL_SIZE")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.processing.thumbnail_size),
            },
            checksum_algorithm: match lookup("DEPOT_CHECKSUM_ALGORITHM") {
                Some(value) => value.parse()?,
                None => defaults.checksum_algorithm,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.queue.max_workers == 0 {
            return Err(anyhow::anyhow!("DEPOT_MAX_WORKERS must be at least 1"));
        }
        if self.import.fetch_timeout.is_zero() {
            return Err(anyhow::anyhow!("DEPOT_FETCH_TIMEOUT_SECS must be at least 1"));
        }
        if self.processing.thumbnail_size == 0 {
            return Err(anyhow::anyhow!("DEPOT_THUMBNAIL_SIZE must be at least 1"));
        }
        if self.storage.backend == StorageBackend::Local
            && self.storage.path.as_os_str().is_empty()
        {
            return Err(anyhow::anyhow!(
                "DEPOT_STORAGE_PATH is required for the local storage backend"
            ));
        }
        Ok(())
    }
}
