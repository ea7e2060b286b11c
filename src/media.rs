//! Media upload flow used by the admin panels.
//!
//! An upload moves through `Idle → Selected → Validating → Uploading →
//! Stored → Idle`, or ends in `Failed` when the selection is rejected or the
//! storage write fails. Progress while uploading is simulated: it rises in
//! fixed steps until it reaches a cap and jumps to 100 once the write returns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{watch, RwLock};

use crate::storage::{ObjectStorage, StorageError};

const MB: usize = 1024 * 1024;

pub const PROGRESS_TICK: Duration = Duration::from_millis(200);
pub const PROGRESS_STEP: u8 = 10;
pub const PROGRESS_CAP: u8 = 90;
/// How long a finished upload stays pollable before it is forgotten.
pub const FINISHED_RETENTION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            Self::Image => "image/",
            Self::Audio => "audio/",
        }
    }

    pub fn max_bytes(&self) -> usize {
        match self {
            Self::Image => 5 * MB,
            Self::Audio => 50 * MB,
        }
    }

    /// Value for the `accept` attribute of file inputs.
    pub fn accept(&self) -> &'static str {
        match self {
            Self::Image => "image/*",
            Self::Audio => "audio/*",
        }
    }
}

/// Which catalog entity a stored file belongs to. Decides the path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTarget {
    Genre,
    Artist,
    Song,
}

impl MediaTarget {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Genre => "genres",
            Self::Artist => "artists",
            Self::Song => "songs",
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Genre | Self::Artist => MediaKind::Image,
            Self::Song => MediaKind::Audio,
        }
    }
}

/// A file picked in an admin form.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please select a valid image file")]
    NotAnImage,

    #[error("Please select a valid audio file (MP3, WAV, etc.)")]
    NotAudio,

    #[error("The file must be smaller than {limit_mb}MB")]
    TooLarge { limit_mb: usize },

    #[error("Could not upload the file: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum UploadState {
    Idle,
    Selected { file_name: String, size: usize },
    Validating,
    Uploading { progress: u8 },
    Stored { url: String },
    Failed { message: String },
}

/// Check a selection against the MIME prefix and size ceiling of `kind`.
pub fn validate(kind: MediaKind, file: &SelectedFile) -> Result<(), UploadError> {
    if !file.content_type.starts_with(kind.mime_prefix()) {
        return Err(match kind {
            MediaKind::Image => UploadError::NotAnImage,
            MediaKind::Audio => UploadError::NotAudio,
        });
    }
    if file.size() > kind.max_bytes() {
        return Err(UploadError::TooLarge {
            limit_mb: kind.max_bytes() / MB,
        });
    }
    Ok(())
}

/// `{prefix}/{millis}_{name}`; the timestamp keeps repeated uploads apart.
pub fn object_path(target: MediaTarget, file_name: &str, timestamp_millis: i64) -> String {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or("file");
    format!("{}/{}_{}", target.prefix(), timestamp_millis, name)
}

/// Human readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `12.35 MB`.
pub fn format_file_size(bytes: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Observable state of one upload: the current state plus everything it has
/// passed through.
#[derive(Debug)]
pub struct UploadProgress {
    tx: watch::Sender<UploadState>,
    history: Mutex<Vec<UploadState>>,
}

impl Default for UploadProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadProgress {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(UploadState::Idle);
        Self {
            tx,
            history: Mutex::new(vec![UploadState::Idle]),
        }
    }

    pub fn set(&self, state: UploadState) {
        if let Ok(mut history) = self.history.lock() {
            history.push(state.clone());
        }
        self.tx.send_replace(state);
    }

    pub fn current(&self) -> UploadState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.tx.subscribe()
    }

    pub fn history(&self) -> Vec<UploadState> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}

/// Uploads in flight, keyed by the id the form generated for them, so the
/// progress bar can poll them.
#[derive(Default)]
pub struct UploadRegistry {
    uploads: Arc<RwLock<HashMap<String, Arc<UploadProgress>>>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, upload_id: &str) -> Arc<UploadProgress> {
        let progress = Arc::new(UploadProgress::new());
        self.uploads
            .write()
            .await
            .insert(upload_id.to_string(), Arc::clone(&progress));
        progress
    }

    /// Current state of an upload. Finished uploads are forgotten once read.
    pub async fn poll(&self, upload_id: &str) -> Option<UploadState> {
        let state = self.uploads.read().await.get(upload_id)?.current();
        if matches!(state, UploadState::Idle | UploadState::Failed { .. }) {
            self.uploads.write().await.remove(upload_id);
        }
        Some(state)
    }

    /// Forget a finished upload after [`FINISHED_RETENTION`], whether or not
    /// anyone polled it. Must be called from within a tokio runtime.
    pub fn release(&self, upload_id: &str, progress: &Arc<UploadProgress>) {
        let uploads = Arc::clone(&self.uploads);
        let upload_id = upload_id.to_string();
        let progress = Arc::clone(progress);

        tokio::spawn(async move {
            tokio::time::sleep(FINISHED_RETENTION).await;
            let mut uploads = uploads.write().await;
            // the id may have been registered again by a resubmitted form
            if uploads
                .get(&upload_id)
                .is_some_and(|current| Arc::ptr_eq(current, &progress))
            {
                uploads.remove(&upload_id);
            }
        });
    }

    pub async fn len(&self) -> usize {
        self.uploads.read().await.len()
    }
}

#[derive(Clone)]
pub struct MediaService {
    storage: Arc<dyn ObjectStorage>,
    uploads: Arc<UploadRegistry>,
}

impl MediaService {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            storage,
            uploads: Arc::new(UploadRegistry::new()),
        }
    }

    pub fn uploads(&self) -> &UploadRegistry {
        &self.uploads
    }

    /// Validate and store `file`, reporting each step to `progress`.
    /// Returns the URL of the stored object.
    pub async fn upload(
        &self,
        target: MediaTarget,
        file: SelectedFile,
        progress: &UploadProgress,
    ) -> Result<String, UploadError> {
        progress.set(UploadState::Selected {
            file_name: file.file_name.clone(),
            size: file.size(),
        });
        progress.set(UploadState::Validating);

        if let Err(e) = validate(target.kind(), &file) {
            progress.set(UploadState::Failed {
                message: e.to_string(),
            });
            return Err(e);
        }

        let path = object_path(
            target,
            &file.file_name,
            chrono::Utc::now().timestamp_millis(),
        );
        progress.set(UploadState::Uploading { progress: 0 });

        let put = self.storage.put(&path, file.bytes, &file.content_type);
        tokio::pin!(put);

        let mut ticker = tokio::time::interval(PROGRESS_TICK);
        // first tick completes immediately
        ticker.tick().await;
        let mut percent = 0u8;

        let result = loop {
            tokio::select! {
                result = &mut put => break result,
                _ = ticker.tick() => {
                    if percent < PROGRESS_CAP {
                        percent = (percent + PROGRESS_STEP).min(PROGRESS_CAP);
                        progress.set(UploadState::Uploading { progress: percent });
                    }
                }
            }
        };

        match result {
            Ok(url) => {
                progress.set(UploadState::Uploading { progress: 100 });
                progress.set(UploadState::Stored { url: url.clone() });
                progress.set(UploadState::Idle);
                Ok(url)
            }
            Err(e) => {
                tracing::error!("Error uploading {}: {}", path, e);
                let e = UploadError::from(e);
                progress.set(UploadState::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Best-effort removal of a stored file. Failures are logged and
    /// swallowed; URLs not issued by this storage are left alone.
    pub async fn discard(&self, url: &str) {
        let Some(path) = self.storage.path_from_url(url) else {
            tracing::debug!("Not deleting {}: not a stored object", url);
            return;
        };

        if let Err(e) = self.storage.delete(&path).await {
            tracing::warn!("Error deleting stored file {}: {}", path, e);
        }
    }
}
