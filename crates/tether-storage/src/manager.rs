use crate::memory::MemoryDisk;
use crate::traits::{Disk, DiskError, DiskResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry of disks addressed by name
#[derive(Clone, Default)]
pub struct DiskManager {
    disks: Arc<RwLock<HashMap<String, Arc<dyn Disk>>>>,
}

impl DiskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disk(self, name: impl Into<String>, disk: Arc<dyn Disk>) -> Self {
        self.insert(name, disk);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn Disk>>> {
        self.disks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn Disk>>> {
        self.disks.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register (or replace) a disk under `name`
    pub fn insert(&self, name: impl Into<String>, disk: Arc<dyn Disk>) {
        let name = name.into();
        tracing::debug!(disk = %name, driver = %disk.driver(), "Registering disk");
        self.write().insert(name, disk);
    }

    /// Look up a disk by name
    pub fn disk(&self, name: &str) -> DiskResult<Arc<dyn Disk>> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| DiskError::UnknownDisk(name.to_string()))
    }

    /// Replace `name` with a fresh in-memory disk and return it for assertions
    pub fn fake(&self, name: impl Into<String>) -> MemoryDisk {
        let disk = MemoryDisk::default();
        self.insert(name, Arc::new(disk.clone()));
        disk
    }

    /// Names of all registered disks, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for DiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskManager")
            .field("disks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PutOptions;
    use crate::DiskDriver;
    use bytes::Bytes;

    #[test]
    fn test_unknown_disk() {
        let manager = DiskManager::new();
        assert!(matches!(
            manager.disk("s3"),
            Err(DiskError::UnknownDisk(name)) if name == "s3"
        ));
    }

    #[tokio::test]
    async fn test_fake_replaces_disk_for_all_clones() {
        let manager = DiskManager::new().with_disk("public", Arc::new(MemoryDisk::default()));
        let shared = manager.clone();

        let fake = manager.fake("public");
        shared
            .disk("public")
            .unwrap()
            .put_as("a", "1.txt", Bytes::from_static(b"x"), &PutOptions::new())
            .await
            .unwrap();

        assert!(fake.has_file("a/1.txt"));
        assert_eq!(shared.disk("public").unwrap().driver(), DiskDriver::Memory);
    }

    #[test]
    fn test_names_sorted() {
        let manager = DiskManager::new();
        manager.fake("public");
        manager.fake("local");
        assert_eq!(manager.names(), vec!["local".to_string(), "public".to_string()]);
    }
}
