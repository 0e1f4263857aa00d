//! Append-only fixity audit log

use crate::keys::validate_component;
use crate::traits::{StoreError, StoreResult};
use async_trait::async_trait;
use depot_core::models::{FixityEntry, ObjectId};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

/// Per-object audit log of fixity checks
///
/// Entries are never modified or removed. `entries` returns them ordered by
/// check time; entries with equal timestamps keep their append order.
#[async_trait]
pub trait FixityLogStore: Send + Sync {
    async fn append(&self, entry: FixityEntry) -> StoreResult<()>;

    async fn entries(&self, id: &ObjectId) -> StoreResult<Vec<FixityEntry>>;
}

#[derive(Default)]
pub struct MemoryFixityLog {
    entries: RwLock<HashMap<ObjectId, Vec<FixityEntry>>>,
}

impl MemoryFixityLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FixityLogStore for MemoryFixityLog {
    async fn append(&self, entry: FixityEntry) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.entry(entry.object_id.clone()).or_default().push(entry);
        Ok(())
    }

    async fn entries(&self, id: &ObjectId) -> StoreResult<Vec<FixityEntry>> {
        let entries = self.entries.read().await;
        let mut log = entries.get(id).cloned().unwrap_or_default();
        log.sort_by_key(|e| e.checked_at);
        Ok(log)
    }
}

/// JSON-lines audit log, one file per object
pub struct LocalFixityLog {
    base_path: PathBuf,
    append_lock: Mutex<()>,
}

impl LocalFixityLog {
    pub async fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into().join("fixity");
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create fixity log directory {}: {}",
                base_path.display(),
                e
            ))
        })?;
        Ok(Self {
            base_path,
            append_lock: Mutex::new(()),
        })
    }

    fn log_path(&self, id: &ObjectId) -> StoreResult<PathBuf> {
        validate_component("object id", id.as_str())?;
        Ok(self.base_path.join(format!("{}.jsonl", id.as_str())))
    }
}

#[async_trait]
impl FixityLogStore for LocalFixityLog {
    async fn append(&self, entry: FixityEntry) -> StoreResult<()> {
        let path = self.log_path(&entry.object_id)?;
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let _guard = self.append_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                StoreError::WriteFailed(format!("Failed to open {}: {}", path.display(), e))
            })?;
        file.write_all(&line).await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn entries(&self, id: &ObjectId) -> StoreResult<Vec<FixityEntry>> {
        let path = self.log_path(id)?;
        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::ReadFailed(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        // A line without its newline is still being appended.
        let mut log = data
            .split_inclusive('\n')
            .filter(|line| line.ends_with('\n') && !line.trim().is_empty())
            .map(|line| serde_json::from_str::<FixityEntry>(line.trim_end()))
            .collect::<Result<Vec<_>, _>>()?;
        log.sort_by_key(|e| e.checked_at);
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::digest;
    use depot_core::models::{ChecksumAlgorithm, FixityOutcome};

    fn entry(id: &str, content: &[u8], stored: &[u8]) -> FixityEntry {
        FixityEntry::compare(
            ObjectId::from(id),
            None,
            digest(ChecksumAlgorithm::Sha256, content),
            digest(ChecksumAlgorithm::Sha256, stored),
        )
    }

    #[tokio::test]
    async fn test_memory_log_is_per_object_and_ordered() {
        let log = MemoryFixityLog::new();
        log.append(entry("a", b"x", b"x")).await.unwrap();
        log.append(entry("b", b"x", b"y")).await.unwrap();
        log.append(entry("a", b"x", b"y")).await.unwrap();

        let a = log.entries(&ObjectId::from("a")).await.unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].outcome, FixityOutcome::Pass);
        assert_eq!(a[1].outcome, FixityOutcome::Fail);
        assert!(log.entries(&ObjectId::from("c")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = LocalFixityLog::new(dir.path()).await.unwrap();
        log.append(entry("obj", b"x", b"x")).await.unwrap();
        log.append(entry("obj", b"x", b"x")).await.unwrap();

        let reopened = LocalFixityLog::new(dir.path()).await.unwrap();
        let entries = reopened.entries(&ObjectId::from("obj")).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.outcome.passed()));
        assert!(entries[0].checked_at <= entries[1].checked_at);
    }

    #[tokio::test]
    async fn test_local_log_ignores_unterminated_tail() {
        let dir = tempfile::tempdir().unwrap();
        let log = LocalFixityLog::new(dir.path()).await.unwrap();
        log.append(entry("obj", b"x", b"x")).await.unwrap();

        let path = dir.path().join("fixity").join("obj.jsonl");
        let mut data = std::fs::read(&path).unwrap();
        data.extend_from_slice(b"{\"object_id\":\"obj\",\"chec");
        std::fs::write(&path, data).unwrap();

        assert_eq!(log.entries(&ObjectId::from("obj")).await.unwrap().len(), 1);
    }
}
