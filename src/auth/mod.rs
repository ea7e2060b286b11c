//! Authentication: the external auth client, session tokens, the session
//! provider that turns an authenticated subject into a catalog `User`, and
//! the route guards built on top of it.

pub mod client;
pub mod guards;
pub mod provider;
pub mod session_store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::store::StoreError;

pub use client::{AuthClient, LocalAuthClient};
pub use guards::{AdminUser, ApiUser, CurrentUser, MaybeUser, SESSION_COOKIE};
pub use provider::{SessionProvider, SessionState};
pub use session_store::{MemorySessionStore, RedisSessionStore, SessionStore};

/// Identity issued by the auth client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSubject {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailInUse,

    #[error("The password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("All fields are required")]
    MissingFields,

    #[error("Please sign in")]
    NotSignedIn,

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Account database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("User record error: {0}")]
    Store(#[from] StoreError),
}

impl From<redis::RedisError> for AuthError {
    fn from(e: redis::RedisError) -> Self {
        Self::SessionStore(e.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        Self::SessionStore(e.to_string())
    }
}
