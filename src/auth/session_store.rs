use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;

use super::{AuthError, AuthSubject};

/// Maps opaque session tokens to the subject they were issued for.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start a session for `subject` and return its token.
    async fn open(&self, subject: &AuthSubject) -> Result<String, AuthError>;

    async fn lookup(&self, token: &str) -> Result<Option<AuthSubject>, AuthError>;

    async fn close(&self, token: &str) -> Result<(), AuthError>;
}

pub fn generate_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Sessions kept in Redis under `session:{token}` with a TTL.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn open(&self, subject: &AuthSubject) -> Result<String, AuthError> {
        let token = generate_token();
        let json = serde_json::to_string(subject)?;
        let mut conn = self.redis.clone();
        let _: () = conn
            .set_ex(Self::key(&token), json, self.ttl_seconds)
            .await?;
        Ok(token)
    }

    async fn lookup(&self, token: &str) -> Result<Option<AuthSubject>, AuthError> {
        let mut conn = self.redis.clone();
        let data: Option<String> = conn.get(Self::key(token)).await?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn close(&self, token: &str) -> Result<(), AuthError> {
        let mut conn = self.redis.clone();
        let _: () = conn.del(Self::key(token)).await?;
        Ok(())
    }
}

/// In-process session store, for tests and single-node development.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, AuthSubject>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn open(&self, subject: &AuthSubject) -> Result<String, AuthError> {
        let token = generate_token();
        self.sessions
            .write()
            .await
            .insert(token.clone(), subject.clone());
        Ok(token)
    }

    async fn lookup(&self, token: &str) -> Result<Option<AuthSubject>, AuthError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn close(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> AuthSubject {
        AuthSubject {
            uid: "uid-1".to_string(),
            email: Some("a@example.com".to_string()),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn test_memory_sessions_open_lookup_close() {
        let store = MemorySessionStore::new();
        let token = store.open(&subject()).await.unwrap();

        assert_eq!(store.lookup(&token).await.unwrap(), Some(subject()));
        assert_eq!(store.lookup("other").await.unwrap(), None);

        store.close(&token).await.unwrap();
        assert_eq!(store.lookup(&token).await.unwrap(), None);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_redis_sessions_open_lookup_close() {
        let store = RedisSessionStore::new(crate::test_utils::setup_test_redis().await, 60);
        let token = store.open(&subject()).await.unwrap();

        assert_eq!(store.lookup(&token).await.unwrap(), Some(subject()));

        store.close(&token).await.unwrap();
        assert_eq!(store.lookup(&token).await.unwrap(), None);
    }

    #[test]
    fn test_tokens_are_long_and_distinct() {
        let a = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, generate_token());
    }
}
