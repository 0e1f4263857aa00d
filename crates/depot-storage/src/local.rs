use crate::keys::{validate_component, version_stem};
use crate::traits::{ContentStore, StoreError, StoreResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use depot_core::digest;
use depot_core::models::{
    version::chronological, ChecksumAlgorithm, ContentObject, ObjectId, TechnicalMetadata,
    Version, VersionRef,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Local filesystem content store
///
/// Object records and version sidecars are JSON files; content is written as
/// raw bytes next to them. Mutations go through a store-wide write lock so
/// that sequence allocation and record updates are never interleaved. Every
/// file is replaced by rename, so lock-free readers see the old or the new
/// contents and never a partial write.
pub struct LocalContentStore {
    base_path: PathBuf,
    algorithm: ChecksumAlgorithm,
    write_lock: Mutex<()>,
}

impl LocalContentStore {
    /// Create a new LocalContentStore rooted at `base_path`
    pub async fn new(
        base_path: impl Into<PathBuf>,
        algorithm: ChecksumAlgorithm,
    ) -> StoreResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(base_path.join("objects"))
            .await
            .map_err(|e| {
                StoreError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    base_path.display(),
                    e
                ))
            })?;

        Ok(LocalContentStore {
            base_path,
            algorithm,
            write_lock: Mutex::new(()),
        })
    }

    fn object_dir(&self, id: &ObjectId) -> StoreResult<PathBuf> {
        validate_component("object id", id.as_str())?;
        Ok(self.base_path.join("objects").join(id.as_str()))
    }

    fn record_path(&self, id: &ObjectId) -> StoreResult<PathBuf> {
        Ok(self.object_dir(id)?.join("object.json"))
    }

    fn version_paths(&self, id: &ObjectId, version_ref: VersionRef) -> StoreResult<(PathBuf, PathBuf)> {
        let dir = self.object_dir(id)?.join("versions");
        let stem = version_stem(version_ref.sequence());
        Ok((
            dir.join(format!("{}.bin", stem)),
            dir.join(format!("{}.json", stem)),
        ))
    }

    fn derivative_path(&self, id: &ObjectId, name: &str) -> StoreResult<PathBuf> {
        validate_component("derivative name", name)?;
        Ok(self.object_dir(id)?.join("derivatives").join(name))
    }

    async fn read_record(&self, id: &ObjectId) -> StoreResult<ContentObject> {
        let path = self.record_path(id)?;
        let data = read_file(&path)
            .await?
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn write_record(&self, object: &ContentObject) -> StoreResult<()> {
        let path = self.record_path(&object.id)?;
        write_file(&path, &serde_json::to_vec_pretty(object)?).await
    }

    async fn read_version(&self, id: &ObjectId, version_ref: VersionRef) -> StoreResult<Version> {
        let (_, meta_path) = self.version_paths(id, version_ref)?;
        let data = read_file(&meta_path)
            .await?
            .ok_or_else(|| StoreError::VersionNotFound {
                object_id: id.clone(),
                version_ref,
            })?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn read_all_versions(&self, id: &ObjectId) -> StoreResult<Vec<Version>> {
        let dir = self.object_dir(id)?.join("versions");
        let mut versions = Vec::new();
        let Some(mut entries) = read_dir(&dir).await? else {
            return Ok(versions);
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read(&path).await?;
            versions.push(serde_json::from_slice::<Version>(&data)?);
        }
        Ok(versions)
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary files are hidden and carry this suffix; listings skip them.
const TEMP_SUFFIX: &str = ".tmp";

fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

/// Read a whole file. A missing file is `None`; any other I/O error is returned.
async fn read_file(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::ReadFailed(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

async fn read_dir(dir: &Path) -> StoreResult<Option<fs::ReadDir>> {
    match fs::read_dir(dir).await {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write `data` to a temporary sibling, flush it, then rename it over `path`.
async fn write_file(path: &Path, data: &[u8]) -> StoreResult<()> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str()))
    else {
        return Err(StoreError::InvalidKey(path.display().to_string()));
    };
    fs::create_dir_all(parent).await?;

    let temp_path = parent.join(format!(
        ".{}.{}.{}{}",
        name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
        TEMP_SUFFIX
    ));

    if let Err(e) = write_and_sync(&temp_path, data).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    fs::rename(&temp_path, path).await.map_err(|e| {
        StoreError::WriteFailed(format!("Failed to replace file {}: {}", path.display(), e))
    })
}

async fn write_and_sync(path: &Path, data: &[u8]) -> StoreResult<()> {
    let mut file = fs::File::create(path).await.map_err(|e| {
        StoreError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
    })?;

    file.write_all(data).await.map_err(|e| {
        StoreError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
    })?;

    file.sync_all().await.map_err(|e| {
        StoreError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
    })?;

    Ok(())
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn ensure_object(
        &self,
        id: &ObjectId,
        declared_mime: Option<&str>,
    ) -> StoreResult<ContentObject> {
        let _guard = self.write_lock.lock().await;
        let declared_mime = declared_mime.filter(|m| !m.trim().is_empty());

        let mut object = match self.read_record(id).await {
            Ok(object) => object,
            Err(StoreError::ObjectNotFound(_)) => {
                let object = ContentObject::new(id.clone());
                self.write_record(&object).await?;
                tracing::debug!(object_id = %id, "Created content object");
                object
            }
            Err(e) => return Err(e),
        };

        if let Some(mime) = declared_mime {
            if object.declared_mime.as_deref() != Some(mime) {
                object.declared_mime = Some(mime.to_string());
                object.updated_at = Utc::now();
                self.write_record(&object).await?;
            }
        }
        Ok(object)
    }

    async fn get_object(&self, id: &ObjectId) -> StoreResult<ContentObject> {
        self.read_record(id).await
    }

    async fn get(&self, id: &ObjectId) -> StoreResult<(ContentObject, Bytes)> {
        let object = self.read_record(id).await?;
        let current = object
            .current_version
            .ok_or_else(|| StoreError::NoContent(id.clone()))?;
        let (_, content) = self.get_version(id, current).await?;
        Ok((object, content))
    }

    async fn put_version(
        &self,
        id: &ObjectId,
        content: Bytes,
        created_at: DateTime<Utc>,
        label: &str,
    ) -> StoreResult<Version> {
        let _guard = self.write_lock.lock().await;
        let mut object = self.read_record(id).await?;
        let start = std::time::Instant::now();

        let version_ref = self
            .read_all_versions(id)
            .await?
            .iter()
            .map(|v| v.version_ref)
            .max()
            .map(|latest| latest.next())
            .unwrap_or(VersionRef::FIRST);

        let version = Version {
            object_id: id.clone(),
            version_ref,
            label: label.to_string(),
            created_at,
            checksum: digest(self.algorithm, &content),
            size_bytes: content.len() as u64,
        };

        let (content_path, meta_path) = self.version_paths(id, version_ref)?;
        write_file(&content_path, &content).await?;
        // The sidecar is written last: a version without one is never listed.
        write_file(&meta_path, &serde_json::to_vec_pretty(&version)?).await?;

        object.updated_at = Utc::now();
        self.write_record(&object).await?;

        tracing::info!(
            path = %content_path.display(),
            object_id = %id,
            version = %version_ref,
            label = %label,
            size_bytes = version.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store version write successful"
        );

        Ok(version)
    }

    async fn get_version(
        &self,
        id: &ObjectId,
        version_ref: VersionRef,
    ) -> StoreResult<(Version, Bytes)> {
        let version = self.read_version(id, version_ref).await?;
        let (content_path, _) = self.version_paths(id, version_ref)?;
        let data = fs::read(&content_path).await.map_err(|e| {
            StoreError::ReadFailed(format!("Failed to read file {}: {}", content_path.display(), e))
        })?;
        Ok((version, Bytes::from(data)))
    }

    async fn list_versions(&self, id: &ObjectId) -> StoreResult<Vec<Version>> {
        // Existence check so that unknown objects are NotFound rather than empty.
        self.read_record(id).await?;
        let mut versions = self.read_all_versions(id).await?;
        versions.sort_by(chronological);
        Ok(versions)
    }

    async fn set_current(
        &self,
        id: &ObjectId,
        version_ref: VersionRef,
    ) -> StoreResult<ContentObject> {
        let _guard = self.write_lock.lock().await;
        let mut object = self.read_record(id).await?;
        let version = self.read_version(id, version_ref).await?;

        object.current_version = Some(version_ref);
        object.checksum = Some(version.checksum);
        object.updated_at = Utc::now();
        self.write_record(&object).await?;
        Ok(object)
    }

    async fn update_metadata(
        &self,
        id: &ObjectId,
        metadata: TechnicalMetadata,
    ) -> StoreResult<ContentObject> {
        let _guard = self.write_lock.lock().await;
        let mut object = self.read_record(id).await?;
        object.metadata = Some(metadata);
        object.updated_at = Utc::now();
        self.write_record(&object).await?;
        Ok(object)
    }

    async fn put_derivative(&self, id: &ObjectId, name: &str, content: Bytes) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.read_record(id).await?;
        let path = self.derivative_path(id, name)?;
        write_file(&path, &content).await?;

        tracing::info!(
            path = %path.display(),
            object_id = %id,
            size_bytes = content.len(),
            "Local store derivative write successful"
        );
        Ok(())
    }

    async fn get_derivative(&self, id: &ObjectId, name: &str) -> StoreResult<Bytes> {
        let path = self.derivative_path(id, name)?;
        let data = read_file(&path)
            .await?
            .ok_or_else(|| StoreError::DerivativeNotFound {
                object_id: id.clone(),
                name: name.to_string(),
            })?;
        Ok(Bytes::from(data))
    }

    async fn list_derivatives(&self, id: &ObjectId) -> StoreResult<Vec<String>> {
        self.read_record(id).await?;
        let dir = self.object_dir(id)?.join("derivatives");
        let mut names = Vec::new();
        let Some(mut entries) = read_dir(&dir).await? else {
            return Ok(names);
        };
        while let Some(entry) = entries.next_entry().await? {
            match entry.file_name().to_str() {
                Some(name) if !is_temp_file(name) => names.push(name.to_string()),
                _ => {}
            }
        }
        names.sort();
        Ok(names)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
