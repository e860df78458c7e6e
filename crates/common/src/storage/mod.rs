//! Thumbnail image storage
//!
//! Uploaded thumbnails are handed to a `ThumbnailStore`, which persists the
//! bytes and returns the public URL recorded on the catalog entry.

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Persist an image and return the URL it is reachable at
    async fn put(&self, file_name: Option<&str>, content_type: Option<&str>, bytes: &[u8]) -> Result<String>;

    /// Delete an image previously returned by `put`. Unknown URLs are ignored.
    async fn remove(&self, url: &str) -> Result<()>;
}

/// Writes thumbnails into a local directory served by the gateway
pub struct LocalThumbnailStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalThumbnailStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.thumbnail_dir),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// File in `dir` that a public URL points at
    fn path_for(&self, url: &str) -> Option<PathBuf> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.'))
            .map(|name| self.dir.join(name))
    }
}

/// Lowercased extension of the client's file name, restricted to plain ASCII
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

#[async_trait::async_trait]
impl ThumbnailStore for LocalThumbnailStore {
    async fn put(&self, file_name: Option<&str>, content_type: Option<&str>, bytes: &[u8]) -> Result<String> {
        if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
            return Err(AppError::Validation {
                message: "Thumbnail must be an image".to_string(),
                field: Some("thumbnail".to_string()),
            });
        }
        if bytes.is_empty() {
            return Err(AppError::Validation {
                message: "Thumbnail file is empty".to_string(),
                field: Some("thumbnail".to_string()),
            });
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Storage {
                message: format!("Failed to create {}: {}", self.dir.display(), e),
            })?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension_of(file_name));
        let path = self.dir.join(&stored_name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage {
                message: format!("Failed to write thumbnail: {}", e),
            })?;

        info!(path = %path.display(), size = bytes.len(), "Thumbnail stored");

        Ok(format!("{}/{}", self.public_base_url, stored_name))
    }

    async fn remove(&self, url: &str) -> Result<()> {
        let Some(path) = self.path_for(url) else {
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "Thumbnail removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage {
                message: format!("Failed to remove thumbnail: {}", e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> LocalThumbnailStore {
        LocalThumbnailStore::new(&StorageConfig {
            thumbnail_dir: dir.to_string_lossy().into_owned(),
            public_base_url: "/uploads/".to_string(),
        })
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Some("cover.PNG")), "png");
        assert_eq!(extension_of(Some("cover")), "bin");
        assert_eq!(extension_of(Some("../../evil.p/ng")), "bin");
        assert_eq!(extension_of(None), "bin");
    }

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let url = store.put(Some("cover.jpg"), Some("image/jpeg"), b"\xff\xd8\xff").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".jpg"));

        let name = url.trim_start_matches("/uploads/");
        let written = std::fs::read(tmp.path().join(name)).unwrap();
        assert_eq!(written, b"\xff\xd8\xff");
    }

    #[tokio::test]
    async fn test_put_rejects_non_images() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let err = store.put(Some("doc.pdf"), Some("application/pdf"), b"%PDF").await.unwrap_err();
        assert!(err.is_client_error());
        assert!(store.put(Some("a.png"), None, b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_remove_deletes_stored_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let url = store.put(Some("cover.png"), Some("image/png"), b"\x89PNG").await.unwrap();
        store.remove(&url).await.unwrap();
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);

        // Already gone
        store.remove(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_ignores_foreign_urls() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("keep.png"), b"x").unwrap();
        let store = store_in(tmp.path());

        store.remove("https://cdn.example.com/keep.png").await.unwrap();
        store.remove("/uploads/../keep.png").await.unwrap();
        store.remove("/uploads/").await.unwrap();
        assert!(tmp.path().join("keep.png").exists());
    }
}
