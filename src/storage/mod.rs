//! Object storage for uploaded media.
//!
//! Blobs are addressed by slash-separated paths (`genres/…`, `artists/…`,
//! `songs/…`) and exposed through durable URLs. The storage can map one of
//! its own URLs back to the path so that replaced files can be removed.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalObjectStorage;
pub use memory::MemoryObjectStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path` and return the URL the object is served from.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<String>;

    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Path of the object behind `url`, if the URL was issued by this storage.
    fn path_from_url(&self, url: &str) -> Option<String>;
}

/// Reject empty, absolute and parent-relative paths.
pub(crate) fn validate_path(path: &str) -> StorageResult<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if bad {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Join `base_url` and a percent-encoded `path`.
pub(crate) fn url_for(base_url: &str, path: &str) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", base_url.trim_end_matches('/'), encoded.join("/"))
}

/// Inverse of [`url_for`]; `None` for URLs outside `base_url`.
pub(crate) fn path_for(base_url: &str, url: &str) -> Option<String> {
    let rest = url
        .strip_prefix(base_url.trim_end_matches('/'))?
        .strip_prefix('/')?;
    let rest = rest.split(['?', '#']).next().unwrap_or_default();

    let decoded: Option<Vec<String>> = rest
        .split('/')
        .map(|segment| urlencoding::decode(segment).ok().map(|s| s.into_owned()))
        .collect();
    let path = decoded?.join("/");

    validate_path(&path).ok().map(|_| path)
}
