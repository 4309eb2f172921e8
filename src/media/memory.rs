//! In-memory media store for tests and local development.

use super::{MediaFile, MediaStore};
use crate::error::{Error, Result};
use crate::models::Photo;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct State {
    assets: DashMap<String, Bytes>,
    next_id: AtomicU64,
    failing_uploads: DashSet<String>,
    failing_deletes: DashSet<String>,
}

/// Media store backed by a map. Can be told to fail specific files or ids.
#[derive(Clone, Default)]
pub struct InMemoryMediaStore {
    state: Arc<State>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads of files named `file_name` fail.
    pub fn fail_uploads_named(&self, file_name: &str) {
        self.state.failing_uploads.insert(file_name.to_string());
    }

    /// Make deletes of `id` fail.
    pub fn fail_deletes_for(&self, id: &str) {
        self.state.failing_deletes.insert(id.to_string());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.assets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.state.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.assets.is_empty()
    }
}

impl MediaStore for InMemoryMediaStore {
    async fn store_one(&self, file: &MediaFile) -> Result<Photo> {
        if self.state.failing_uploads.contains(&file.file_name) {
            return Err(Error::UpstreamError(format!(
                "upload of {} rejected",
                file.file_name
            )));
        }

        let n = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("upload/mem-{}", n);
        self.state.assets.insert(id.clone(), file.bytes.clone());

        Ok(Photo {
            url: format!("memory://{}", id),
            id,
        })
    }

    async fn remove_one(&self, id: &str) -> Result<()> {
        if self.state.failing_deletes.contains(id) {
            return Err(Error::UpstreamError(format!("delete of {} rejected", id)));
        }

        match self.state.assets.remove(id) {
            Some(_) => Ok(()),
            None => Err(Error::UpstreamError(format!("{} not found", id))),
        }
    }
}
