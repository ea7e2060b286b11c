use std::path::PathBuf;

use async_trait::async_trait;

use super::{path_for, url_for, validate_path, ObjectStorage, StorageError, StorageResult};

/// Stores objects as files under a root directory. The router serves that
/// directory at `base_url`.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn file_path(&self, path: &str) -> StorageResult<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<String> {
        let file_path = self.file_path(path)?;
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file_path, &bytes).await?;

        tracing::info!(
            "Stored {} ({} bytes, {}) at {}",
            path,
            bytes.len(),
            content_type,
            file_path.display()
        );
        Ok(url_for(&self.base_url, path))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let file_path = self.file_path(path)?;
        match tokio::fs::remove_file(&file_path).await {
            Ok(()) => {
                tracing::info!("Deleted stored object {}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        path_for(&self.base_url, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("music-catalog-test-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let root = temp_root();
        let storage = LocalObjectStorage::new(&root, "/media");

        let url = storage
            .put("genres/1_rock.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        assert_eq!(url, "/media/genres/1_rock.png");
        let written = tokio::fs::read(root.join("genres/1_rock.png")).await.unwrap();
        assert_eq!(written, vec![1, 2, 3]);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_delete_missing_object_is_not_found() {
        let storage = LocalObjectStorage::new(temp_root(), "/media");
        let result = storage.delete("songs/none.mp3").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_put_rejects_escaping_path() {
        let storage = LocalObjectStorage::new(temp_root(), "/media");
        let result = storage.put("../x.png", vec![], "image/png").await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }
}
