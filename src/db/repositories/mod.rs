use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::db::models::{Artist, Entity, Genre, NewUser, Song, User};
use crate::db::store::{Document, DocumentStore, Fields, StoreError, StoreResult};

/// Data access façade for one entity type over a document store.
///
/// Repositories hold no state of their own and are cheap to clone; the store
/// is the only source of truth.
pub struct Repository<T: Entity> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

pub type GenreRepository = Repository<Genre>;
pub type ArtistRepository = Repository<Artist>;
pub type SongRepository = Repository<Song>;
pub type UserRepository = Repository<User>;

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Every record, newest first.
    pub async fn get_all(&self) -> StoreResult<Vec<T>> {
        self.store
            .list(T::COLLECTION)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<T>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Records whose `field` equals `value`, newest first.
    pub async fn get_by_field(
        &self,
        field: &str,
        value: impl Into<Value> + Send,
    ) -> StoreResult<Vec<T>> {
        let value = value.into();
        self.store
            .query_eq(T::COLLECTION, field, &value)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Insert a new record and return the id the store assigned to it.
    pub async fn create(&self, data: &T::New) -> StoreResult<String> {
        let id = self.store.add(T::COLLECTION, to_fields(data)?).await?;
        tracing::info!("Created {} record {}", T::COLLECTION, id);
        Ok(id)
    }

    /// Apply a partial update; fields left unset in `patch` keep their values.
    pub async fn update(&self, id: &str, patch: &T::Patch) -> StoreResult<()> {
        self.store
            .update(T::COLLECTION, id, to_fields(patch)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(T::COLLECTION, id).await?;
        tracing::info!("Deleted {} record {}", T::COLLECTION, id);
        Ok(())
    }
}

impl ArtistRepository {
    pub async fn get_by_genre(&self, genre_id: &str) -> StoreResult<Vec<Artist>> {
        self.get_by_field("genreId", genre_id).await
    }
}

impl SongRepository {
    pub async fn get_by_artist(&self, artist_id: &str) -> StoreResult<Vec<Song>> {
        self.get_by_field("artistId", artist_id).await
    }
}

impl UserRepository {
    /// Write the user record under the auth subject id, replacing any previous
    /// record. The id has to match the externally issued one, so the generic
    /// auto-id create does not apply.
    pub async fn create_user(&self, id: &str, data: &NewUser) -> StoreResult<()> {
        self.store
            .set(User::COLLECTION, id, to_fields(data)?)
            .await?;
        tracing::info!("Wrote user record {}", id);
        Ok(())
    }
}

fn to_fields<P: Serialize>(payload: &P) -> StoreResult<Fields> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(mut fields)) => {
            // envelope fields are owned by the store
            fields.remove("id");
            fields.remove("createdAt");
            Ok(fields)
        }
        _ => Err(StoreError::InvalidPayload),
    }
}

fn decode<T: Entity>(document: Document) -> StoreResult<T> {
    let Document {
        id,
        mut fields,
        created_at,
    } = document;

    fields.insert("id".to_string(), Value::String(id.clone()));
    fields.insert(
        "createdAt".to_string(),
        Value::String(created_at.to_rfc3339()),
    );

    serde_json::from_value(Value::Object(fields)).map_err(|source| StoreError::Decode {
        collection: T::COLLECTION.to_string(),
        id,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{GenrePatch, NewGenre, Role};
    use crate::db::store::MemoryDocumentStore;
    use chrono::SubsecRound;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn memory_store() -> Arc<MemoryDocumentStore> {
        Arc::new(MemoryDocumentStore::new())
    }

    #[tokio::test]
    async fn test_create_then_get_by_id() {
        let genres = GenreRepository::new(memory_store());
        let before = chrono::Utc::now().trunc_subsecs(6);

        let id = genres
            .create(&NewGenre {
                name: "Rock".to_string(),
                image: "/media/genres/1_rock.png".to_string(),
            })
            .await
            .unwrap();

        let genre = genres.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(genre.id, id);
        assert_eq!(genre.name, "Rock");
        assert_eq!(genre.image, "/media/genres/1_rock.png");
        assert!(genre.created_at >= before);
    }

    #[tokio::test]
    async fn test_get_by_id_absent_is_none() {
        let genres = GenreRepository::new(memory_store());
        assert!(genres.get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_only_touches_given_fields() {
        let genres = GenreRepository::new(memory_store());
        let id = genres
            .create(&NewGenre {
                name: "Rock".to_string(),
                image: "a.png".to_string(),
            })
            .await
            .unwrap();
        let before = genres.get_by_id(&id).await.unwrap().unwrap();

        genres
            .update(
                &id,
                &GenrePatch {
                    name: Some("Hard Rock".to_string()),
                    image: None,
                },
            )
            .await
            .unwrap();

        let after = genres.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(after.name, "Hard Rock");
        assert_eq!(after.image, before.image);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_create_user_uses_given_id() {
        let users = UserRepository::new(memory_store());
        users
            .create_user(
                "auth-subject-1",
                &NewUser {
                    email: "a@example.com".to_string(),
                    display_name: "A".to_string(),
                    role: Role::User,
                },
            )
            .await
            .unwrap();

        let user = users.get_by_id("auth-subject-1").await.unwrap().unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn test_malformed_document_is_decode_error() {
        let store = memory_store();
        store
            .add("genres", json!({ "image": 7 }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let genres = GenreRepository::new(store);
        assert!(matches!(
            genres.get_all().await,
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn test_to_fields_strips_envelope() {
        let fields = to_fields(&json!({ "id": "x", "createdAt": "t", "name": "n" })).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["name"], "n");
        assert!(to_fields(&"scalar").is_err());
    }
}
