//! Local-disk media store.
//!
//! Files are written under one directory with a generated name. The file name
//! is the asset id and `/uploads/{file}` is its URL; the HTTP layer serves
//! that directory.

use super::{MediaFile, MediaStore};
use crate::error::{Error, Result};
use crate::models::Photo;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

/// URL prefix under which stored files are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

#[derive(Clone, Debug)]
pub struct LocalMediaStore {
    root: Arc<PathBuf>,
}

impl LocalMediaStore {
    /// Store files under `root`, creating it if necessary.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        info!("✓ Local media store at {}", root.display());
        Ok(LocalMediaStore {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stored_name(original: &str) -> String {
        let extension = Path::new(original)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| e.to_ascii_lowercase());

        match extension {
            Some(ext) => format!("{}.{}", Uuid::now_v7(), ext),
            None => Uuid::now_v7().to_string(),
        }
    }

    /// Path of an asset id, refusing anything that is not a bare file name.
    fn resolve(&self, id: &str) -> Result<PathBuf> {
        let mut components = Path::new(id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(id)),
            _ => Err(Error::validation(format!("Invalid media id: {}", id))),
        }
    }
}

impl MediaStore for LocalMediaStore {
    async fn store_one(&self, file: &MediaFile) -> Result<Photo> {
        if file.bytes.is_empty() {
            return Err(Error::UpstreamError(format!(
                "{} is empty",
                file.file_name
            )));
        }

        let name = Self::stored_name(&file.file_name);
        fs::write(self.root.join(&name), &file.bytes)
            .await
            .map_err(|e| Error::UpstreamError(format!("write {}: {}", name, e)))?;

        debug!("Stored {} as {}", file.file_name, name);
        Ok(Photo {
            url: format!("{}/{}", UPLOADS_ROUTE, name),
            id: name,
        })
    }

    async fn remove_one(&self, id: &str) -> Result<()> {
        let path = self.resolve(id)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| Error::UpstreamError(format!("remove {}: {}", id, e)))?;
        debug!("Removed {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_remove() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LocalMediaStore::new(dir.path()).expect("Failed to create store");

        let photo = store
            .store_one(&MediaFile::new("Shoe.JPG", "image/jpeg", b"jpeg".to_vec()))
            .await
            .expect("Failed to store");

        assert!(photo.id.ends_with(".jpg"));
        assert_eq!(photo.url, format!("/uploads/{}", photo.id));
        assert!(dir.path().join(&photo.id).exists());

        store.remove_one(&photo.id).await.expect("Failed to remove");
        assert!(!dir.path().join(&photo.id).exists());
    }

    #[tokio::test]
    async fn test_remove_missing_fails() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LocalMediaStore::new(dir.path()).expect("Failed to create store");

        assert!(store.remove_one("missing.png").await.is_err());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LocalMediaStore::new(dir.path().join("media")).expect("Failed to create store");

        let err = store.remove_one("../secret.txt").await.unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
        assert!(store.remove_one("a/b.png").await.is_err());
    }

    #[tokio::test]
    async fn test_batch_delete_report() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LocalMediaStore::new(dir.path()).expect("Failed to create store");
        let photos = store
            .upload(&[
                MediaFile::new("a.png", "image/png", b"a".to_vec()),
                MediaFile::new("b.png", "image/png", b"b".to_vec()),
            ])
            .await
            .expect("Failed to upload");

        let mut ids: Vec<String> = photos.into_iter().map(|p| p.id).collect();
        ids.push("gone.png".to_string());

        let report = store.delete(&ids).await;
        assert_eq!((report.deleted, report.failed), (2, 1));
    }
}
