//! Document store abstraction.
//!
//! A document store holds schema-flexible JSON objects grouped into named
//! collections. Each document carries a store-assigned id and a creation
//! timestamp alongside its payload. Repositories are built on top of this
//! trait so that tests can swap the SQL-backed store for the in-memory one.

pub mod memory;
pub mod sql;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryDocumentStore;
pub use sql::SqlDocumentStore;

/// Field payload of a document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("malformed document {collection}/{id}: {source}")]
    Decode {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document payload must be a JSON object")]
    InvalidPayload,

    #[error("document {collection}/{id} does not exist")]
    NotFound { collection: String, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection, newest first.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Documents whose `field` equals `value`, newest first.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>>;

    /// Insert under a generated id, stamping the creation time. Returns the id.
    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Write the document at a known id, replacing any previous content.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Merge `fields` into an existing document. Fails if it does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Remove a document. Removing a missing id is not an error.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

/// Creation timestamp, kept at the microsecond precision PostgreSQL stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Generate a new document id.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Newest first; ties keep their relative order.
pub(crate) fn sort_newest_first(documents: &mut [Document]) {
    documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub(crate) fn matches(document: &Document, field: &str, value: &Value) -> bool {
    document.fields.get(field) == Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn doc(id: &str, created_at: DateTime<Utc>, fields: Value) -> Document {
        Document {
            id: id.to_string(),
            fields: fields.as_object().cloned().unwrap(),
            created_at,
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let base = Utc::now();
        let mut docs = vec![
            doc("old", base - Duration::seconds(10), json!({})),
            doc("new", base, json!({})),
            doc("mid", base - Duration::seconds(5), json!({})),
        ];

        sort_newest_first(&mut docs);

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_matches_compares_json_values() {
        let d = doc("a", Utc::now(), json!({ "genreId": "g1", "rank": 3 }));

        assert!(matches(&d, "genreId", &json!("g1")));
        assert!(matches(&d, "rank", &json!(3)));
        assert!(!matches(&d, "genreId", &json!("g2")));
        assert!(!matches(&d, "missing", &json!("g1")));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
