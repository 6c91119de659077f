#[cfg(feature = "storage-local")]
use crate::LocalDisk;
#[cfg(feature = "storage-s3")]
use crate::S3Disk;
use crate::{Disk, DiskDriver, DiskError, DiskManager, DiskResult, MemoryDisk};
use std::sync::Arc;
use tether_core::{DiskConfig, FilesConfig};

/// Create one disk from its configuration
pub async fn create_disk(config: &DiskConfig) -> DiskResult<Arc<dyn Disk>> {
    match config.driver {
        #[cfg(feature = "storage-s3")]
        DiskDriver::S3 => {
            let bucket = config.bucket.clone().ok_or_else(|| {
                DiskError::ConfigError(format!("Disk '{}': bucket not configured", config.name))
            })?;
            let region = config.region.clone().ok_or_else(|| {
                DiskError::ConfigError(format!("Disk '{}': region not configured", config.name))
            })?;

            let disk = S3Disk::new(bucket, region, config.endpoint.clone(), config.url.clone())
                .await?;
            Ok(Arc::new(disk))
        }

        #[cfg(not(feature = "storage-s3"))]
        DiskDriver::S3 => Err(DiskError::ConfigError(
            "S3 disk driver not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        DiskDriver::Local => {
            let root = config.root.clone().ok_or_else(|| {
                DiskError::ConfigError(format!("Disk '{}': root not configured", config.name))
            })?;
            let url = config.url.clone().unwrap_or_else(|| "/storage".to_string());

            let disk = LocalDisk::new(root, url).await?;
            Ok(Arc::new(disk))
        }

        #[cfg(not(feature = "storage-local"))]
        DiskDriver::Local => Err(DiskError::ConfigError(
            "Local disk driver not available (storage-local feature not enabled)".to_string(),
        )),

        DiskDriver::Memory => {
            let url = config.url.clone().unwrap_or_else(|| "/storage".to_string());
            Ok(Arc::new(MemoryDisk::new(url)))
        }
    }
}

/// Create a disk manager holding every disk declared in the configuration
pub async fn create_disks(config: &FilesConfig) -> DiskResult<DiskManager> {
    let manager = DiskManager::new();
    for disk in &config.disks {
        manager.insert(disk.name.clone(), create_disk(disk).await?);
    }

    tracing::info!(
        default_disk = %config.default_disk,
        disks = ?manager.names(),
        "Disks configured"
    );

    Ok(manager)
}
