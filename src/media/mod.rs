//! Media storage for product photos.
//!
//! A [`MediaStore`] stores one file or deletes one asset by id. On top of
//! those two primitives it provides the batch operations the catalog uses:
//!
//! - [`upload`](MediaStore::upload): every file is sent concurrently and the
//!   batch succeeds or fails as a whole. Assets stored before a failure are
//!   removed again.
//! - [`delete`](MediaStore::delete): every id is deleted concurrently and
//!   independently. Failures are collected into a [`DeleteReport`], never
//!   returned as an error.

use crate::error::Result;
use crate::models::Photo;
use bytes::Bytes;
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;

pub mod cloudinary;
pub mod local;
pub mod memory;

pub use cloudinary::{CloudinaryConfig, CloudinaryMediaStore};
pub use local::LocalMediaStore;
pub use memory::InMemoryMediaStore;

/// One file received from a client.
#[derive(Clone, Debug)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        MediaFile {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Outcome of a batch delete.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub deleted: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Trait for media store implementations.
pub trait MediaStore: Send + Sync + Clone + 'static {
    /// Store one file and return its id and public URL.
    ///
    /// # Errors
    /// Returns `Error::UpstreamError` if the store rejects the file
    fn store_one(&self, file: &MediaFile) -> impl Future<Output = Result<Photo>> + Send;

    /// Delete one asset by id.
    ///
    /// # Errors
    /// Returns `Err` if the asset cannot be deleted
    fn remove_one(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Store every file concurrently, all or nothing.
    ///
    /// # Errors
    /// Returns the first failure, after removing the files that were stored.
    fn upload(&self, files: &[MediaFile]) -> impl Future<Output = Result<Vec<Photo>>> + Send {
        async move {
            let uploads: Vec<_> = files.iter().map(|f| self.store_one(f)).collect();
            let results = join_all(uploads).await;

            let mut photos = Vec::with_capacity(results.len());
            let mut first_error = None;
            for result in results {
                match result {
                    Ok(photo) => photos.push(photo),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }

            match first_error {
                None => {
                    info!("Uploaded {} media files", photos.len());
                    Ok(photos)
                }
                Some(e) => {
                    warn!(
                        "Media upload failed ({}), rolling back {} stored files",
                        e,
                        photos.len()
                    );
                    let ids: Vec<String> = photos.into_iter().map(|p| p.id).collect();
                    let report = self.delete(&ids).await;
                    if !report.is_complete() {
                        warn!("Media rollback incomplete: {:?}", report.errors);
                    }
                    Err(e)
                }
            }
        }
    }

    /// Delete every id concurrently, collecting failures.
    fn delete(&self, ids: &[String]) -> impl Future<Output = DeleteReport> + Send {
        async move {
            let removals: Vec<_> = ids.iter().map(|id| self.remove_one(id)).collect();
            let results = join_all(removals).await;

            let mut report = DeleteReport::default();
            for (id, result) in ids.iter().zip(results) {
                match result {
                    Ok(()) => report.deleted += 1,
                    Err(e) => {
                        report.failed += 1;
                        report.errors.push(format!("{}: {}", id, e));
                    }
                }
            }

            if report.failed > 0 {
                warn!(
                    "Media delete: {} deleted, {} failed",
                    report.deleted, report.failed
                );
            } else {
                debug!("Media delete: {} deleted", report.deleted);
            }
            report
        }
    }
}

/// Media store selected at start-up.
#[derive(Clone)]
pub enum MediaBackend {
    Local(LocalMediaStore),
    Cloudinary(CloudinaryMediaStore),
}

impl MediaBackend {
    pub fn name(&self) -> &'static str {
        match self {
            MediaBackend::Local(_) => "local",
            MediaBackend::Cloudinary(_) => "cloudinary",
        }
    }
}

impl MediaStore for MediaBackend {
    async fn store_one(&self, file: &MediaFile) -> Result<Photo> {
        match self {
            MediaBackend::Local(store) => store.store_one(file).await,
            MediaBackend::Cloudinary(store) => store.store_one(file).await,
        }
    }

    async fn remove_one(&self, id: &str) -> Result<()> {
        match self {
            MediaBackend::Local(store) => store.remove_one(id).await,
            MediaBackend::Cloudinary(store) => store.remove_one(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(n: usize) -> Vec<MediaFile> {
        (0..n)
            .map(|i| MediaFile::new(format!("photo-{}.jpg", i), "image/jpeg", vec![i as u8; 4]))
            .collect()
    }

    #[tokio::test]
    async fn test_upload_returns_one_photo_per_file() {
        let store = InMemoryMediaStore::new();
        let photos = store.upload(&files(3)).await.expect("Failed to upload");
        assert_eq!(photos.len(), 3);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_upload_is_all_or_nothing() {
        let store = InMemoryMediaStore::new();
        store.fail_uploads_named("photo-1.jpg");

        let result = store.upload(&files(3)).await;
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_collects_failures() {
        let store = InMemoryMediaStore::new();
        let photos = store.upload(&files(3)).await.expect("Failed to upload");
        let ids: Vec<String> = photos.iter().map(|p| p.id.clone()).collect();
        store.fail_deletes_for(&ids[1]);

        let report = store.delete(&ids).await;

        assert_eq!(report.deleted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with(&ids[1]));
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_delete_nothing() {
        let store = InMemoryMediaStore::new();
        assert_eq!(store.delete(&[]).await, DeleteReport::default());
    }
}
