//! Content store abstraction trait
//!
//! This module defines the `ContentStore` trait that all storage backends must
//! implement. The pipeline mutates content objects only through it.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use depot_core::models::{ContentObject, ObjectId, TechnicalMetadata, Version, VersionRef};
use depot_core::{PipelineError, StorageBackend};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Object {0} has no current content")]
    NoContent(ObjectId),

    #[error("Version {version_ref} not found for object {object_id}")]
    VersionNotFound {
        object_id: ObjectId,
        version_ref: VersionRef,
    },

    #[error("Derivative {name} not found for object {object_id}")]
    DerivativeNotFound { object_id: ObjectId, name: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ObjectNotFound(_)
            | StoreError::NoContent(_)
            | StoreError::VersionNotFound { .. }
            | StoreError::DerivativeNotFound { .. } => PipelineError::NotFound(err.to_string()),
            StoreError::InvalidKey(msg) => PipelineError::InvalidInput(msg),
            StoreError::ConfigError(msg) => PipelineError::Configuration(msg),
            other => PipelineError::Store {
                context: "content store".to_string(),
                source: other.into(),
            },
        }
    }
}

/// Content store abstraction
///
/// Versions are append-only: `put_version` allocates the next sequence number
/// and never overwrites an existing version. `set_current` is the only way to
/// change which bytes an object serves.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Return the object, creating an empty record if it does not exist yet.
    ///
    /// A declared MIME type is recorded when given; an existing declaration is
    /// replaced only by a new non-empty one.
    async fn ensure_object(
        &self,
        id: &ObjectId,
        declared_mime: Option<&str>,
    ) -> StoreResult<ContentObject>;

    async fn get_object(&self, id: &ObjectId) -> StoreResult<ContentObject>;

    /// Current content of an object together with its record
    async fn get(&self, id: &ObjectId) -> StoreResult<(ContentObject, Bytes)>;

    /// Append a version stamped with `created_at`. The object must exist.
    async fn put_version(
        &self,
        id: &ObjectId,
        content: Bytes,
        created_at: DateTime<Utc>,
        label: &str,
    ) -> StoreResult<Version>;

    async fn get_version(
        &self,
        id: &ObjectId,
        version_ref: VersionRef,
    ) -> StoreResult<(Version, Bytes)>;

    /// All versions of an object, ordered by creation time then sequence
    async fn list_versions(&self, id: &ObjectId) -> StoreResult<Vec<Version>>;

    /// Make `version_ref` the current content, updating the object's checksum
    async fn set_current(&self, id: &ObjectId, version_ref: VersionRef)
        -> StoreResult<ContentObject>;

    async fn update_metadata(
        &self,
        id: &ObjectId,
        metadata: TechnicalMetadata,
    ) -> StoreResult<ContentObject>;

    async fn put_derivative(&self, id: &ObjectId, name: &str, content: Bytes) -> StoreResult<()>;

    async fn get_derivative(&self, id: &ObjectId, name: &str) -> StoreResult<Bytes>;

    /// Names of all derivatives stored for an object, sorted
    async fn list_derivatives(&self, id: &ObjectId) -> StoreResult<Vec<String>>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
