//! Test utilities for Music Catalog
//!
//! Provides helpers for creating isolated test environments with:
//! - In-memory SQLite databases (one per test)
//! - Isolated Redis connections (separate DB numbers)
//! - AppState factories backed by in-memory stores
//! - Test data generators

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use migration::MigratorTrait;
use redis::aio::ConnectionManager;
use sea_orm::{Database, DatabaseConnection};

use crate::{
    auth::{LocalAuthClient, MemorySessionStore},
    config::Config,
    db::{
        models::{Artist, Genre, NewArtist, NewGenre, NewSong, Role, Song, User, UserPatch},
        store::MemoryDocumentStore,
    },
    state::AppState,
    storage::MemoryObjectStorage,
};

/// Global counter for test isolation
static TEST_COUNTER: AtomicU8 = AtomicU8::new(0);

/// Get a unique test ID for this test
pub fn get_test_id() -> u8 {
    TEST_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Setup an in-memory SQLite database with all migrations applied
///
/// Each call creates a fresh, isolated database perfect for parallel testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Setup a test Redis connection using a unique database number
///
/// Redis supports 16 databases (0-15), so we use test_id % 16 to isolate tests
pub async fn setup_test_redis() -> ConnectionManager {
    let db_number = get_test_id() % 16;

    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let test_redis_url = format!("{}/{}", redis_url.trim_end_matches('/'), db_number);

    let client = redis::Client::open(test_redis_url.as_str())
        .expect("Failed to create Redis client");

    let conn = client
        .get_connection_manager()
        .await
        .expect("Failed to connect to Redis");

    let mut conn_clone = conn.clone();
    redis::cmd("FLUSHDB")
        .query_async::<_, ()>(&mut conn_clone)
        .await
        .expect("Failed to flush Redis DB");

    conn
}

/// Auth client with the cheapest argon2 parameters, so tests stay fast.
pub fn fast_auth_client(db: DatabaseConnection) -> LocalAuthClient {
    let params = argon2::Params::new(8, 1, 1, None).expect("valid argon2 params");
    LocalAuthClient::with_params(db, params)
}

/// Create a test configuration with sensible defaults
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 3000,
        media_root: std::env::temp_dir().join("music-catalog-test-media"),
        media_base_url: "/media".to_string(),
        session_ttl_seconds: 3600,
    }
}

/// AppState plus handles on its in-memory backends, for assertions.
#[derive(Clone)]
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryDocumentStore>,
    pub storage: Arc<MemoryObjectStorage>,
    pub sessions: Arc<MemorySessionStore>,
}

pub async fn setup_test_app() -> TestApp {
    let store = Arc::new(MemoryDocumentStore::new());
    let storage = Arc::new(MemoryObjectStorage::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let auth = Arc::new(fast_auth_client(setup_test_db().await));

    let state = AppState::new(
        test_config(),
        store.clone(),
        storage.clone(),
        auth,
        sessions.clone(),
    );

    TestApp {
        state,
        store,
        storage,
        sessions,
    }
}

/// Create a complete test AppState with in-memory backends
pub async fn setup_test_app_state() -> AppState {
    setup_test_app().await.state
}

// ============================================================================
// Test Data Factories
// ============================================================================

pub async fn create_test_genre(state: &AppState, name: &str) -> Genre {
    let id = state
        .genres
        .create(&NewGenre {
            name: name.to_string(),
            image: format!("memory://bucket/genres/0_{}.png", name.to_lowercase()),
        })
        .await
        .expect("Failed to create test genre");

    state
        .genres
        .get_by_id(&id)
        .await
        .expect("Failed to read test genre")
        .expect("Test genre missing")
}

pub async fn create_test_artist(state: &AppState, genre_id: &str, name: &str) -> Artist {
    let id = state
        .artists
        .create(&NewArtist {
            name: name.to_string(),
            image: format!("memory://bucket/artists/0_{}.png", name.to_lowercase()),
            genre_id: genre_id.to_string(),
        })
        .await
        .expect("Failed to create test artist");

    state
        .artists
        .get_by_id(&id)
        .await
        .expect("Failed to read test artist")
        .expect("Test artist missing")
}

pub async fn create_test_song(state: &AppState, artist_id: &str, name: &str) -> Song {
    let id = state
        .songs
        .create(&NewSong {
            name: name.to_string(),
            audio_url: format!("memory://bucket/songs/0_{}.mp3", name.to_lowercase()),
            artist_id: artist_id.to_string(),
            duration: Some(180.0),
        })
        .await
        .expect("Failed to create test song");

    state
        .songs
        .get_by_id(&id)
        .await
        .expect("Failed to read test song")
        .expect("Test song missing")
}

/// Register an account with the given role and return its session token.
pub async fn sign_in_as(state: &AppState, email: &str, role: Role) -> (String, User) {
    let (token, user) = state
        .sessions
        .register(email, "secret123", "Test User")
        .await
        .expect("Failed to register test user");

    if role != Role::User {
        state
            .users
            .update(
                &user.id,
                &UserPatch {
                    display_name: None,
                    role: Some(role),
                },
            )
            .await
            .expect("Failed to set test user role");
    }

    let user = state
        .users
        .get_by_id(&user.id)
        .await
        .expect("Failed to read test user")
        .expect("Test user missing");

    (token, user)
}
