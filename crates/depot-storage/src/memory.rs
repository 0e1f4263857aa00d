use crate::keys::validate_component;
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
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

struct ObjectEntry {
    object: ContentObject,
    versions: Vec<(Version, Bytes)>,
    derivatives: BTreeMap<String, Bytes>,
}

impl ObjectEntry {
    fn version(&self, version_ref: VersionRef) -> Option<&(Version, Bytes)> {
        self.versions
            .iter()
            .find(|(version, _)| version.version_ref == version_ref)
    }
}

/// In-memory content store
///
/// Holds everything behind a single `RwLock`. Counts mutating calls so tests
/// can assert that an operation performed no writes.
pub struct MemoryContentStore {
    algorithm: ChecksumAlgorithm,
    objects: RwLock<HashMap<ObjectId, ObjectEntry>>,
    writes: AtomicUsize,
}

impl MemoryContentStore {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self {
            algorithm,
            objects: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of mutating operations performed so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new(ChecksumAlgorithm::default())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn ensure_object(
        &self,
        id: &ObjectId,
        declared_mime: Option<&str>,
    ) -> StoreResult<ContentObject> {
        validate_component("object id", id.as_str())?;
        let declared_mime = declared_mime.filter(|m| !m.trim().is_empty());

        let mut objects = self.objects.write().await;
        let created = !objects.contains_key(id);
        let entry = objects.entry(id.clone()).or_insert_with(|| ObjectEntry {
            object: ContentObject::new(id.clone()),
            versions: Vec::new(),
            derivatives: BTreeMap::new(),
        });

        let mut changed = created;
        if let Some(mime) = declared_mime {
            if entry.object.declared_mime.as_deref() != Some(mime) {
                entry.object.declared_mime = Some(mime.to_string());
                entry.object.updated_at = Utc::now();
                changed = true;
            }
        }
        let object = entry.object.clone();
        drop(objects);

        if changed {
            self.record_write();
        }
        if created {
            tracing::debug!(object_id = %id, "Created content object");
        }
        Ok(object)
    }

    async fn get_object(&self, id: &ObjectId) -> StoreResult<ContentObject> {
        let objects = self.objects.read().await;
        objects
            .get(id)
            .map(|entry| entry.object.clone())
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))
    }

    async fn get(&self, id: &ObjectId) -> StoreResult<(ContentObject, Bytes)> {
        let objects = self.objects.read().await;
        let entry = objects
            .get(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        let current = entry
            .object
            .current_version
            .ok_or_else(|| StoreError::NoContent(id.clone()))?;
        let (_, content) = entry
            .version(current)
            .ok_or_else(|| StoreError::VersionNotFound {
                object_id: id.clone(),
                version_ref: current,
            })?;
        Ok((entry.object.clone(), content.clone()))
    }

    async fn put_version(
        &self,
        id: &ObjectId,
        content: Bytes,
        created_at: DateTime<Utc>,
        label: &str,
    ) -> StoreResult<Version> {
        let checksum = digest(self.algorithm, &content);

        let mut objects = self.objects.write().await;
        let entry = objects
            .get_mut(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;

        let version_ref = entry
            .versions
            .iter()
            .map(|(version, _)| version.version_ref)
            .max()
            .map(|latest| latest.next())
            .unwrap_or(VersionRef::FIRST);

        let version = Version {
            object_id: id.clone(),
            version_ref,
            label: label.to_string(),
            created_at,
            checksum,
            size_bytes: content.len() as u64,
        };
        entry.versions.push((version.clone(), content));
        entry.object.updated_at = Utc::now();
        drop(objects);

        self.record_write();
        tracing::debug!(
            object_id = %id,
            version = %version_ref,
            label = %label,
            size_bytes = version.size_bytes,
            "Stored version"
        );
        Ok(version)
    }

    async fn get_version(
        &self,
        id: &ObjectId,
        version_ref: VersionRef,
    ) -> StoreResult<(Version, Bytes)> {
        let objects = self.objects.read().await;
        let entry = objects
            .get(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        entry
            .version(version_ref)
            .cloned()
            .ok_or_else(|| StoreError::VersionNotFound {
                object_id: id.clone(),
                version_ref,
            })
    }

    async fn list_versions(&self, id: &ObjectId) -> StoreResult<Vec<Version>> {
        let objects = self.objects.read().await;
        let entry = objects
            .get(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        let mut versions: Vec<Version> = entry.versions.iter().map(|(v, _)| v.clone()).collect();
        versions.sort_by(chronological);
        Ok(versions)
    }

    async fn set_current(
        &self,
        id: &ObjectId,
        version_ref: VersionRef,
    ) -> StoreResult<ContentObject> {
        let mut objects = self.objects.write().await;
        let entry = objects
            .get_mut(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        let checksum = entry
            .version(version_ref)
            .map(|(version, _)| version.checksum.clone())
            .ok_or_else(|| StoreError::VersionNotFound {
                object_id: id.clone(),
                version_ref,
            })?;

        entry.object.current_version = Some(version_ref);
        entry.object.checksum = Some(checksum);
        entry.object.updated_at = Utc::now();
        let object = entry.object.clone();
        drop(objects);

        self.record_write();
        Ok(object)
    }

    async fn update_metadata(
        &self,
        id: &ObjectId,
        metadata: TechnicalMetadata,
    ) -> StoreResult<ContentObject> {
        let mut objects = self.objects.write().await;
        let entry = objects
            .get_mut(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        entry.object.metadata = Some(metadata);
        entry.object.updated_at = Utc::now();
        let object = entry.object.clone();
        drop(objects);

        self.record_write();
        Ok(object)
    }

    async fn put_derivative(&self, id: &ObjectId, name: &str, content: Bytes) -> StoreResult<()> {
        validate_component("derivative name", name)?;
        let mut objects = self.objects.write().await;
        let entry = objects
            .get_mut(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        entry.derivatives.insert(name.to_string(), content);
        drop(objects);

        self.record_write();
        Ok(())
    }

    async fn get_derivative(&self, id: &ObjectId, name: &str) -> StoreResult<Bytes> {
        let objects = self.objects.read().await;
        let entry = objects
            .get(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        entry
            .derivatives
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::DerivativeNotFound {
                object_id: id.clone(),
                name: name.to_string(),
            })
    }

    async fn list_derivatives(&self, id: &ObjectId) -> StoreResult<Vec<String>> {
        let objects = self.objects.read().await;
        let entry = objects
            .get(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        Ok(entry.derivatives.keys().cloned().collect())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_put_version_requires_object() {
        let store = MemoryContentStore::default();
        let result = store
            .put_version(&ObjectId::from("nope"), Bytes::from_static(b"x"), Utc::now(), "v")
            .await;
        assert!(matches!(result, Err(StoreError::ObjectNotFound(_))));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_versions_are_sequenced_and_listed_chronologically() {
        let store = MemoryContentStore::default();
        let id = ObjectId::from("obj");
        store.ensure_object(&id, None).await.unwrap();

        let v1 = store
            .put_version(&id, Bytes::from_static(b"one"), ts("2016-09-29T00:00:00Z"), "late")
            .await
            .unwrap();
        let v2 = store
            .put_version(&id, Bytes::from_static(b"two"), ts("2016-09-28T00:00:00Z"), "early")
            .await
            .unwrap();
        assert_eq!(v1.version_ref, VersionRef::FIRST);
        assert_eq!(v2.version_ref, VersionRef::new(2));

        let labels: Vec<String> = store
            .list_versions(&id)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.label)
            .collect();
        assert_eq!(labels, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_get_returns_current_content() {
        let store = MemoryContentStore::default();
        let id = ObjectId::from("obj");
        store.ensure_object(&id, Some("text/plain")).await.unwrap();
        assert!(matches!(store.get(&id).await, Err(StoreError::NoContent(_))));

        let v1 = store
            .put_version(&id, Bytes::from_static(b"first"), Utc::now(), "version1")
            .await
            .unwrap();
        let v2 = store
            .put_version(&id, Bytes::from_static(b"second"), Utc::now(), "version2")
            .await
            .unwrap();
        store.set_current(&id, v1.version_ref).await.unwrap();
        let (_, content) = store.get(&id).await.unwrap();
        assert_eq!(&content[..], b"first");

        let object = store.set_current(&id, v2.version_ref).await.unwrap();
        assert_eq!(object.checksum, Some(v2.checksum));
        assert_eq!(object.declared_mime.as_deref(), Some("text/plain"));
        let (_, content) = store.get(&id).await.unwrap();
        assert_eq!(&content[..], b"second");
    }

    #[tokio::test]
    async fn test_set_current_unknown_version() {
        let store = MemoryContentStore::default();
        let id = ObjectId::from("obj");
        store.ensure_object(&id, None).await.unwrap();
        let result = store.set_current(&id, VersionRef::new(9)).await;
        assert!(matches!(result, Err(StoreError::VersionNotFound { .. })));
    }

    #[tokio::test]
    async fn test_derivatives_round_trip() {
        let store = MemoryContentStore::default();
        let id = ObjectId::from("obj");
        store.ensure_object(&id, None).await.unwrap();
        store
            .put_derivative(&id, "thumbnail.png", Bytes::from_static(b"png"))
            .await
            .unwrap();
        assert_eq!(
            &store.get_derivative(&id, "thumbnail.png").await.unwrap()[..],
            b"png"
        );
        assert_eq!(store.list_derivatives(&id).await.unwrap(), vec!["thumbnail.png"]);
        assert!(store.put_derivative(&id, "../x", Bytes::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_object_is_idempotent() {
        let store = MemoryContentStore::default();
        let id = ObjectId::from("obj");
        store.ensure_object(&id, None).await.unwrap();
        store.ensure_object(&id, None).await.unwrap();
        assert_eq!(store.write_count(), 1);
    }
}
