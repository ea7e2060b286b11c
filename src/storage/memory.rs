use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{path_for, url_for, validate_path, ObjectStorage, StorageError, StorageResult};

const BASE_URL: &str = "memory://bucket";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object storage kept in memory, with switches to make calls fail.
#[derive(Default)]
pub struct MemoryObjectStorage {
    objects: RwLock<HashMap<String, StoredObject>>,
    put_latency: Option<Duration>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    puts: AtomicUsize,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay each `put`, long enough for progress ticks to be observed.
    pub fn with_put_latency(latency: Duration) -> Self {
        Self {
            put_latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.objects.read().await.contains_key(path)
    }

    pub async fn object(&self, path: &str) -> Option<StoredObject> {
        self.objects.read().await.get(path).cloned()
    }

    pub async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<String> {
        validate_path(path)?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.put_latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("uploads switched off".to_string()));
        }

        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(url_for(BASE_URL, path))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("deletes switched off".to_string()));
        }
        match self.objects.write().await.remove(path) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        path_for(BASE_URL, url)
    }
}
