use crate::keys::{file_key, join_url, validate_key};
use crate::traits::{Disk, DiskError, DiskResult, PutOptions, Visibility};
use crate::DiskDriver;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem disk
#[derive(Clone, Debug)]
pub struct LocalDisk {
    base_path: PathBuf,
    base_url: String,
}

impl LocalDisk {
    /// Create a new LocalDisk instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "storage/app/public")
    /// * `base_url` - Base URL for serving files (e.g., "/storage" or "https://example.com/storage")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> DiskResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            DiskError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalDisk {
            base_path,
            base_url: base_url.into(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a key to a filesystem path, refusing anything that leaves the root
    fn key_to_path(&self, key: &str) -> DiskResult<PathBuf> {
        validate_key(key)?;

        let path = self.base_path.join(key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            DiskError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(DiskError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> DiskResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    #[cfg(unix)]
    async fn apply_visibility(&self, path: &Path, visibility: Visibility) -> DiskResult<()> {
        use std::os::unix::fs::PermissionsExt;

        let mode = match visibility {
            Visibility::Public => 0o644,
            Visibility::Private => 0o600,
        };
        fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn apply_visibility(&self, _path: &Path, _visibility: Visibility) -> DiskResult<()> {
        Ok(())
    }
}

#[async_trait]
impl Disk for LocalDisk {
    async fn put_as(
        &self,
        folder: &str,
        name: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> DiskResult<String> {
        let key = file_key(folder, name);
        let path = self.key_to_path(&key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            DiskError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            DiskError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            DiskError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        if let Some(visibility) = options.visibility {
            self.apply_visibility(&path, visibility).await?;
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local disk write successful"
        );

        Ok(key)
    }

    async fn get(&self, key: &str) -> DiskResult<Bytes> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(DiskError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            DiskError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> DiskResult<bool> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(key = %key, "Local disk delete skipped, file missing");
            return Ok(false);
        }

        fs::remove_file(&path).await.map_err(|e| {
            DiskError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local disk delete successful"
        );

        Ok(true)
    }

    async fn exists(&self, key: &str) -> DiskResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn url(&self, key: &str) -> DiskResult<String> {
        validate_key(key)?;
        Ok(join_url(&self.base_url, key))
    }

    async fn temporary_url(&self, key: &str, _expires_in: Duration) -> DiskResult<String> {
        self.url(key)
    }

    fn path(&self, key: &str) -> DiskResult<PathBuf> {
        let path = self.key_to_path(key)?;
        if path.is_absolute() {
            return Ok(path);
        }
        Ok(std::env::current_dir()?.join(path))
    }

    fn driver(&self) -> DiskDriver {
        DiskDriver::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn disk(dir: &Path) -> LocalDisk {
        LocalDisk::new(dir, "/storage").await.unwrap()
    }

    #[tokio::test]
    async fn test_local_disk_put_get() {
        let dir = tempdir().unwrap();
        let disk = disk(dir.path()).await;

        let key = disk
            .put_as(
                "posts/document",
                "5.pdf",
                Bytes::from_static(b"%PDF-1.4"),
                &PutOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(key, "posts/document/5.pdf");
        assert!(dir.path().join("posts/document/5.pdf").exists());
        assert_eq!(disk.get(&key).await.unwrap(), Bytes::from_static(b"%PDF-1.4"));
    }

    #[tokio::test]
    async fn test_put_replaces_existing_blob() {
        let dir = tempdir().unwrap();
        let disk = disk(dir.path()).await;

        disk.put_as("a", "1.txt", Bytes::from_static(b"one"), &PutOptions::new())
            .await
            .unwrap();
        disk.put_as("a", "1.txt", Bytes::from_static(b"two"), &PutOptions::new())
            .await
            .unwrap();

        assert_eq!(disk.get("a/1.txt").await.unwrap(), Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let disk = disk(dir.path()).await;

        let result = disk.get("../../../etc/passwd").await;
        assert!(matches!(result, Err(DiskError::InvalidKey(_))));

        let result = disk.delete("../etc/passwd").await;
        assert!(matches!(result, Err(DiskError::InvalidKey(_))));

        let result = disk.exists("/etc/passwd").await;
        assert!(matches!(result, Err(DiskError::InvalidKey(_))));

        let result = disk
            .put_as("..", "passwd", Bytes::new(), &PutOptions::new())
            .await;
        assert!(matches!(result, Err(DiskError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_disk_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let disk = disk(dir.path()).await;

        assert!(!disk.delete("nonexistent/file.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_disk_delete_existing() {
        let dir = tempdir().unwrap();
        let disk = disk(dir.path()).await;

        let key = disk
            .put_as("a", "gone.txt", Bytes::from_static(b"x"), &PutOptions::new())
            .await
            .unwrap();

        assert!(disk.delete(&key).await.unwrap());
        assert!(!disk.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_url_and_path() {
        let dir = tempdir().unwrap();
        let disk = LocalDisk::new(dir.path(), "/storage/").await.unwrap();

        assert_eq!(
            disk.url("posts/document/5.pdf").unwrap(),
            "/storage/posts/document/5.pdf"
        );
        let path = disk.path("posts/document/5.pdf").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("posts/document/5.pdf"));
        assert_eq!(
            disk.temporary_url("a/1.txt", Duration::from_secs(60))
                .await
                .unwrap(),
            "/storage/a/1.txt"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_private_visibility_sets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let disk = disk(dir.path()).await;

        let key = disk
            .put_as(
                "secret",
                "1.txt",
                Bytes::from_static(b"x"),
                &PutOptions::new().visibility(Visibility::Private),
            )
            .await
            .unwrap();

        let mode = std::fs::metadata(dir.path().join(key))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
