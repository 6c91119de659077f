//! Disk abstraction trait
//!
//! This module defines the Disk trait that all blob store backends must implement.

use crate::DiskDriver;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Disk operation errors
#[derive(Debug, Error)]
pub enum DiskError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Disk [{0}] is not configured")]
    UnknownDisk(String),

    #[error("Operation not supported by the {driver} driver: {operation}")]
    Unsupported {
        driver: DiskDriver,
        operation: &'static str,
    },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for disk operations
pub type DiskResult<T> = Result<T, DiskError>;

/// Visibility of a stored blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Options passed along with a write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub visibility: Option<Visibility>,
}

impl PutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// Disk abstraction trait
///
/// All blob store backends (local filesystem, S3, in-memory) implement this
/// trait so the attachment helper can work with any of them by name.
#[async_trait]
pub trait Disk: Send + Sync {
    /// Write `data` as `{folder}/{name}`, replacing any previous blob, and return the key
    async fn put_as(
        &self,
        folder: &str,
        name: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> DiskResult<String>;

    /// Read a blob by key
    async fn get(&self, key: &str) -> DiskResult<Bytes>;

    /// Delete a blob by key
    ///
    /// Returns `false` when there was nothing to delete. A missing blob is not an error.
    async fn delete(&self, key: &str) -> DiskResult<bool>;

    /// Check if a blob exists
    async fn exists(&self, key: &str) -> DiskResult<bool>;

    /// Public URL of a blob. May be absolute or site-rooted (e.g. `/storage/...`).
    fn url(&self, key: &str) -> DiskResult<String>;

    /// Temporary URL for direct access. Backends without signing return `url`.
    async fn temporary_url(&self, key: &str, expires_in: Duration) -> DiskResult<String>;

    /// Absolute local path of a blob. Only local disks support this.
    fn path(&self, key: &str) -> DiskResult<PathBuf>;

    /// Get the driver type
    fn driver(&self) -> DiskDriver;
}
