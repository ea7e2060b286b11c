//! Document store persisted in a relational database through sea-orm.
//!
//! All collections share the `documents` table; the payload is stored as a
//! serialized JSON object. Equality queries decode the collection and filter
//! in process, which keeps the store portable across PostgreSQL and SQLite.

use async_trait::async_trait;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;

use super::{
    generate_id, matches, now, Document, DocumentStore, Fields, StoreError, StoreResult,
};
use crate::db::entities::document;

#[derive(Clone)]
pub struct SqlDocumentStore {
    db: DatabaseConnection,
}

impl SqlDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_row(&self, collection: &str, id: &str) -> StoreResult<Option<document::Model>> {
        Ok(
            document::Entity::find_by_id((collection.to_string(), id.to_string()))
                .one(&self.db)
                .await?,
        )
    }

    async fn list_rows(&self, collection: &str) -> StoreResult<Vec<Document>> {
        document::Entity::find()
            .filter(document::Column::Collection.eq(collection))
            .order_by_desc(document::Column::CreatedAt)
            .order_by_asc(document::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }
}

fn decode(row: document::Model) -> StoreResult<Document> {
    let fields: Fields =
        serde_json::from_str(&row.data).map_err(|source| StoreError::Decode {
            collection: row.collection.clone(),
            id: row.id.clone(),
            source,
        })?;

    Ok(Document {
        id: row.id,
        fields,
        created_at: row.created_at.to_utc(),
    })
}

fn encode(fields: &Fields) -> StoreResult<String> {
    serde_json::to_string(fields).map_err(|_| StoreError::InvalidPayload)
}

#[async_trait]
impl DocumentStore for SqlDocumentStore {
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.list_rows(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.find_row(collection, id).await?.map(decode).transpose()
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        let mut documents = self.list_rows(collection).await?;
        documents.retain(|d| matches(d, field, value));
        Ok(documents)
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = generate_id();
        let row = document::ActiveModel {
            collection: Set(collection.to_string()),
            id: Set(id.clone()),
            data: Set(encode(&fields)?),
            created_at: Set(now().into()),
        };
        document::Entity::insert(row).exec(&self.db).await?;

        tracing::debug!("Added document {}/{}", collection, id);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let row = document::ActiveModel {
            collection: Set(collection.to_string()),
            id: Set(id.to_string()),
            data: Set(encode(&fields)?),
            created_at: Set(now().into()),
        };

        document::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([document::Column::Collection, document::Column::Id])
                    .update_columns([document::Column::Data, document::Column::CreatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        tracing::debug!("Wrote document {}/{}", collection, id);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        // read and write back in one transaction so concurrent patches to
        // different fields both survive; FOR UPDATE is a no-op on SQLite
        let txn = self.db.begin().await?;

        let row = document::Entity::find_by_id((collection.to_string(), id.to_string()))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let mut merged = decode(row.clone())?.fields;
        merged.extend(fields);

        let mut active: document::ActiveModel = row.into();
        active.data = Set(encode(&merged)?);
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        document::Entity::delete_by_id((collection.to_string(), id.to_string()))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_add_and_get_round_trip() {
        let store = SqlDocumentStore::new(setup_test_db().await);
        let id = store
            .add("genres", fields(json!({ "name": "Rock", "image": "/media/genres/1_r.png" })))
            .await
            .unwrap();

        let doc = store.get("genres", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Rock");
        assert!(store.get("genres", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_document() {
        let store = SqlDocumentStore::new(setup_test_db().await);
        store
            .set("users", "uid-1", fields(json!({ "role": "user" })))
            .await
            .unwrap();
        store
            .set("users", "uid-1", fields(json!({ "role": "admin" })))
            .await
            .unwrap();

        let docs = store.list("users").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["role"], "admin");
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing() {
        let store = SqlDocumentStore::new(setup_test_db().await);
        let id = store
            .add("artists", fields(json!({ "name": "X", "genreId": "g1" })))
            .await
            .unwrap();

        store
            .update("artists", &id, fields(json!({ "name": "Y" })))
            .await
            .unwrap();
        let doc = store.get("artists", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Y");
        assert_eq!(doc.fields["genreId"], "g1");

        let missing = store
            .update("artists", "nope", fields(json!({ "name": "Z" })))
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_same_instant_ties_break_by_id() {
        let store = SqlDocumentStore::new(setup_test_db().await);
        let created_at = now();
        for id in ["b", "c", "a"] {
            document::Entity::insert(document::ActiveModel {
                collection: Set("genres".to_string()),
                id: Set(id.to_string()),
                data: Set("{}".to_string()),
                created_at: Set(created_at.into()),
            })
            .exec(&store.db)
            .await
            .unwrap();
        }

        let ids: Vec<String> = store
            .list("genres")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_query_eq_filters_within_collection() {
        let store = SqlDocumentStore::new(setup_test_db().await);
        store
            .add("songs", fields(json!({ "name": "a", "artistId": "a1" })))
            .await
            .unwrap();
        store
            .add("songs", fields(json!({ "name": "b", "artistId": "a2" })))
            .await
            .unwrap();
        store
            .add("artists", fields(json!({ "name": "c", "artistId": "a1" })))
            .await
            .unwrap();

        let docs = store.query_eq("songs", "artistId", &json!("a1")).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["name"], "a");
    }

    #[tokio::test]
    async fn test_delete_removes_document() {
        let store = SqlDocumentStore::new(setup_test_db().await);
        let id = store.add("genres", fields(json!({ "name": "Pop" }))).await.unwrap();

        store.delete("genres", &id).await.unwrap();
        store.delete("genres", &id).await.unwrap();

        assert!(store.list("genres").await.unwrap().is_empty());
    }
}
