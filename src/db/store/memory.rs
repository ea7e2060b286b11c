//! In-memory document store used by tests and local experiments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    generate_id, matches, now, sort_newest_first, Document, DocumentStore, Fields, StoreError,
    StoreResult,
};

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, HashMap<String, Document>>>,
    latency: Option<Duration>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every operation, so concurrent callers interleave at await points.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make every subsequent operation fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of write operations (add, set, update, delete) performed so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of documents currently in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    async fn enter(&self) -> StoreResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }

    async fn enter_write(&self) -> StoreResult<()> {
        self.enter().await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn collect<F>(&self, collection: &str, keep: F) -> Vec<Document>
    where
        F: Fn(&Document) -> bool,
    {
        let collections = self.collections.read().await;
        let mut documents: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.values().filter(|d| keep(d)).cloned().collect())
            .unwrap_or_default();
        // HashMap order is arbitrary; break timestamp ties by id for stable output
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        sort_newest_first(&mut documents);
        documents
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.enter().await?;
        Ok(self.collect(collection, |_| true).await)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.enter().await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        self.enter().await?;
        Ok(self.collect(collection, |d| matches(d, field, value)).await)
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        self.enter_write().await?;
        let id = generate_id();
        let document = Document {
            id: id.clone(),
            fields,
            created_at: now(),
        };
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.enter_write().await?;
        let document = Document {
            id: id.to_string(),
            fields,
            created_at: now(),
        };
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.enter_write().await?;
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        document.fields.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.enter_write().await?;
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let store = MemoryDocumentStore::new();
        let id = store
            .add("genres", fields(json!({ "name": "Rock" })))
            .await
            .unwrap();

        let doc = store.get("genres", &id).await.unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.fields["name"], "Rock");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryDocumentStore::new();
        store.add("genres", fields(json!({ "name": "Rock" }))).await.unwrap();

        assert!(store.list("artists").await.unwrap().is_empty());
        assert_eq!(store.len("genres").await, 1);
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let result = store
            .update("genres", "nope", fields(json!({ "name": "Jazz" })))
            .await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryDocumentStore::new();
        let id = store
            .add("genres", fields(json!({ "name": "Rock", "image": "a.png" })))
            .await
            .unwrap();

        store
            .update("genres", &id, fields(json!({ "image": "b.png" })))
            .await
            .unwrap();

        let doc = store.get("genres", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Rock");
        assert_eq!(doc.fields["image"], "b.png");
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryDocumentStore::new();
        assert!(store.delete("genres", "ghost").await.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryDocumentStore::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.list("genres").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.get("genres", "x").await.is_err());

        store.set_unavailable(false);
        assert!(store.list("genres").await.is_ok());
    }
}
