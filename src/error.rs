use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::db::store::StoreError;
use crate::media::UploadError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Message suitable for the error banner shown on screens.
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(_) => {
                "The catalog could not be reached. Please try again.".to_string()
            }
            Self::Storage(_) => "The file storage could not be reached.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::Store(ref e) => {
                tracing::error!("Document store error: {}", e);
                match e {
                    StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "Record not found"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "Document store error occurred"),
                }
            }
            Self::Storage(ref e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::BAD_GATEWAY, "File storage request failed")
            }
            Self::Auth(ref e) => match e {
                AuthError::SessionStore(_)
                | AuthError::Database(_)
                | AuthError::Hashing(_)
                | AuthError::Store(_) => {
                    tracing::error!("Auth backend error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Authentication backend error")
                }
                AuthError::InvalidCredentials | AuthError::NotSignedIn => {
                    (StatusCode::UNAUTHORIZED, "Authentication failed")
                }
                _ => (StatusCode::BAD_REQUEST, "Invalid account details"),
            },
            Self::Upload(_) => (StatusCode::BAD_REQUEST, "Upload rejected"),
            Self::Validation(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            Self::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.as_str()),
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
