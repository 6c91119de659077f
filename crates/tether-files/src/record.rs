use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tether_core::FilesError;

use crate::locale::LocaleColumnResolver;
use crate::slots::FileSlots;

/// A persisted row that owns file slots
///
/// Implemented by the host application's model types. The attachment helper
/// only reads and writes slot metadata through this trait and calls `save`
/// after every store or delete.
#[async_trait]
pub trait Record: Send + Sync {
    /// Table name, first segment of every storage path
    fn table(&self) -> &str;

    /// Primary key as it appears in file names; `None` before the row is inserted
    fn key(&self) -> Option<String>;

    /// Whether the row exists in the database
    fn exists(&self) -> bool;

    /// Last modification time, used for versioned URLs
    fn updated_at(&self) -> Option<DateTime<Utc>>;

    fn file_slots(&self) -> &FileSlots;

    fn file_slots_mut(&mut self) -> &mut FileSlots;

    /// Persist the record, including its slot columns
    async fn save(&mut self) -> Result<(), FilesError>;

    /// Locale naming convention for slot columns, if the record uses one
    fn locale_columns(&self) -> Option<&dyn LocaleColumnResolver> {
        None
    }

    /// Disk this record type always stores its files on
    fn file_disk(&self) -> Option<&str> {
        None
    }
}
