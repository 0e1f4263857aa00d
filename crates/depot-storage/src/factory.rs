use crate::{
    ContentStore, FixityLogStore, LocalContentStore, LocalFixityLog, MemoryContentStore,
    MemoryFixityLog, StorageBackend, StoreResult,
};
use depot_core::models::ChecksumAlgorithm;
use depot_core::StorageSettings;
use std::sync::Arc;

/// Create a content store based on configuration
pub async fn create_content_store(
    settings: &StorageSettings,
    algorithm: ChecksumAlgorithm,
) -> StoreResult<Arc<dyn ContentStore>> {
    match settings.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryContentStore::new(algorithm))),
        StorageBackend::Local => {
            let store = LocalContentStore::new(&settings.path, algorithm).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Create the fixity log matching the configured backend
pub async fn create_fixity_log(settings: &StorageSettings) -> StoreResult<Arc<dyn FixityLogStore>> {
    match settings.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryFixityLog::new())),
        StorageBackend::Local => {
            let log = LocalFixityLog::new(&settings.path).await?;
            Ok(Arc::new(log))
        }
    }
}
