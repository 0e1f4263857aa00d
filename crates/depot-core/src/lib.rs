//! Depot Core Library
//!
//! This crate provides the domain models, error types and configuration that are
//! shared across all Depot components: the content store, the characterization
//! stage, the job queue and the version importer.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod job_error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use checksum::digest;
pub use config::{ImportSettings, PipelineConfig, ProcessingSettings, QueueSettings, StorageSettings};
pub use error::{ErrorMetadata, LogLevel, PipelineError, PipelineResult};
pub use job_error::{JobError, JobResultExt};
pub use storage_types::StorageBackend;
