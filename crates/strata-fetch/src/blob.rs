//! Blob storage collaborator (out of scope external system —
//! `spec.md` names only the bucket-object contract, not a concrete
//! implementation). `BlobStore` stands in for it; `LocalBlobStore`
//! backs it in tests.

use crate::error::{FetchError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

pub trait BlobStore: Send + Sync {
    /// Fetch `key` (e.g. `source-code/{storage_path}`) into `dest`,
    /// returning the path to the downloaded file.
    fn fetch_to(&self, key: &str, dest: &Path) -> Result<std::path::PathBuf>;
}

/// Test double backing `BlobStore` with an in-memory key → bytes map.
#[derive(Default)]
pub struct LocalBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl LocalBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.into(), bytes);
    }
}

impl BlobStore for LocalBlobStore {
    fn fetch_to(&self, key: &str, dest: &Path) -> Result<std::path::PathBuf> {
        let objects = self.objects.lock().unwrap();
        let bytes = objects
            .get(key)
            .ok_or_else(|| FetchError::NotFound(key.to_string()))?;
        let file_name = key.rsplit('/').next().unwrap_or("object.bin");
        let path = dest.join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}
