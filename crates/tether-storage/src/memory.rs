//! In-memory disk
//!
//! Keeps blobs in a map inside the process. Used as the fake disk in tests
//! (see [`crate::DiskManager::fake`]) and for throwaway environments.

use crate::keys::{file_key, join_url, validate_key};
use crate::traits::{Disk, DiskError, DiskResult, PutOptions};
use crate::DiskDriver;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    options: PutOptions,
}

/// Disk that stores blobs in memory
#[derive(Clone, Debug)]
pub struct MemoryDisk {
    files: Arc<Mutex<BTreeMap<String, StoredBlob>>>,
    base_url: String,
}

impl MemoryDisk {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            files: Arc::new(Mutex::new(BTreeMap::new())),
            base_url: base_url.into(),
        }
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<String, StoredBlob>> {
        // every write is a single insert or remove, so a poisoned map is still consistent
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check if a blob exists (for test assertions)
    pub fn has_file(&self, key: &str) -> bool {
        self.files().contains_key(key)
    }

    /// Get blob data (for test assertions)
    pub fn get_file(&self, key: &str) -> Option<Bytes> {
        self.files().get(key).map(|blob| blob.data.clone())
    }

    /// Options the blob was written with (for test assertions)
    pub fn put_options(&self, key: &str) -> Option<PutOptions> {
        self.files().get(key).map(|blob| blob.options.clone())
    }

    /// All stored keys in order
    pub fn keys(&self) -> Vec<String> {
        self.files().keys().cloned().collect()
    }
}

impl Default for MemoryDisk {
    fn default() -> Self {
        Self::new("/storage")
    }
}

#[async_trait]
impl Disk for MemoryDisk {
    async fn put_as(
        &self,
        folder: &str,
        name: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> DiskResult<String> {
        let key = file_key(folder, name);
        validate_key(&key)?;

        tracing::debug!(key = %key, size_bytes = data.len(), "Memory disk write");

        self.files().insert(
            key.clone(),
            StoredBlob {
                data,
                options: options.clone(),
            },
        );
        Ok(key)
    }

    async fn get(&self, key: &str) -> DiskResult<Bytes> {
        validate_key(key)?;
        self.get_file(key)
            .ok_or_else(|| DiskError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> DiskResult<bool> {
        validate_key(key)?;
        Ok(self.files().remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> DiskResult<bool> {
        validate_key(key)?;
        Ok(self.has_file(key))
    }

    fn url(&self, key: &str) -> DiskResult<String> {
        validate_key(key)?;
        Ok(join_url(&self.base_url, key))
    }

    async fn temporary_url(&self, key: &str, _expires_in: Duration) -> DiskResult<String> {
        self.url(key)
    }

    fn path(&self, _key: &str) -> DiskResult<PathBuf> {
        Err(DiskError::Unsupported {
            driver: DiskDriver::Memory,
            operation: "path",
        })
    }

    fn driver(&self) -> DiskDriver {
        DiskDriver::Memory
    }
}
