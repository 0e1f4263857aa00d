//! Per-object mutual exclusion.
//!
//! Every mutation of one object (deposit, characterization, derivative writes,
//! version import) runs while holding that object's guard. Different objects
//! never contend with each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use depot_core::models::ObjectId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = HashMap<ObjectId, Arc<AsyncMutex<()>>>;

#[derive(Clone, Default)]
pub struct ObjectLocks {
    table: Arc<Mutex<LockTable>>,
}

/// Exclusive hold on one object. Released on drop.
#[derive(Debug)]
pub struct ObjectGuard {
    object_id: ObjectId,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<Mutex<LockTable>>,
}

impl Drop for ObjectGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        // Only the table's own reference left: nobody holds or waits on it.
        if let Some(lock) = table.get(&self.object_id) {
            if Arc::strong_count(lock) == 1 {
                table.remove(&self.object_id);
            }
        }
    }
}

impl ObjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, object_id: &ObjectId) -> Arc<AsyncMutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table
            .entry(object_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait until `object_id` is free and take it.
    pub async fn lock(&self, object_id: &ObjectId) -> ObjectGuard {
        let lock = self.entry(object_id);
        let guard = lock.lock_owned().await;
        ObjectGuard {
            object_id: object_id.clone(),
            guard: Some(guard),
            table: self.table.clone(),
        }
    }

    /// Number of objects with a live lock entry
    pub fn tracked(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_same_object_is_exclusive() {
        let locks = ObjectLocks::new();
        let id = ObjectId::from("a");

        let guard = locks.lock(&id).await;
        let mut waiting = task::spawn(locks.lock(&id));
        assert_pending!(waiting.poll());

        drop(guard);
        assert!(waiting.is_woken());
        let _second = assert_ready!(waiting.poll());
        assert_eq!(locks.tracked(), 1);
    }

    #[tokio::test]
    async fn test_different_objects_do_not_contend() {
        let locks = ObjectLocks::new();
        let _a = locks.lock(&ObjectId::from("a")).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(&ObjectId::from("b"))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_entries_pruned_after_release() {
        let locks = ObjectLocks::new();
        {
            let _a = locks.lock(&ObjectId::from("a")).await;
            let _b = locks.lock(&ObjectId::from("b")).await;
            assert_eq!(locks.tracked(), 2);
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_critical_sections_never_overlap() {
        let locks = ObjectLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&ObjectId::from("shared")).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.tracked(), 0);
    }
}
