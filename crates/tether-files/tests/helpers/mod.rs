#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tether_core::{init_tracing, DiskConfig, DiskDriver, FilesConfig, FilesError};
use tether_files::{
    FileAttachments, FileSlot, FileSlots, LocaleColumnResolver, Record, SlotColumns,
    UnderscoreLocale,
};
use tether_storage::{Disk, DiskError, DiskManager, DiskResult, MemoryDisk, PutOptions};

pub const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";
pub const JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0xFF, 0xD9,
];

/// Row as written by the last save
#[derive(Debug, Clone)]
pub struct Row {
    pub slots: FileSlots,
    pub updated_at: DateTime<Utc>,
}

/// In-memory table store standing in for the database
#[derive(Debug, Clone, Default)]
pub struct Database {
    rows: Arc<Mutex<BTreeMap<(String, i64), Row>>>,
    next_id: Arc<AtomicI64>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self, table: &str, id: Option<i64>, slots: &FileSlots) -> (i64, DateTime<Utc>) {
        let id = id.unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let updated_at = Utc::now();
        self.rows.lock().unwrap().insert(
            (table.to_string(), id),
            Row {
                slots: slots.clone(),
                updated_at,
            },
        );
        (id, updated_at)
    }

    pub fn row(&self, table: &str, id: i64) -> Option<Row> {
        self.rows
            .lock()
            .unwrap()
            .get(&(table.to_string(), id))
            .cloned()
    }

    /// Persisted values of the slot stored under `presence_column`
    pub fn slot(&self, record: &Post, presence_column: &str) -> FileSlot {
        let row = self
            .row(record.table(), record.id.expect("record has no id"))
            .expect("row not found");
        let slot = row
            .slots
            .iter()
            .find(|(columns, _)| columns.presence == presence_column)
            .map(|(_, slot)| slot.clone())
            .unwrap_or_default();
        slot
    }
}

/// Test record; `Post::public` and `Post::translatable` mirror the model variants
#[derive(Debug)]
pub struct Post {
    pub id: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
    pub saves: usize,
    table: String,
    disk: Option<String>,
    locale: Option<UnderscoreLocale>,
    slots: FileSlots,
    db: Database,
}

impl Post {
    pub fn new(db: &Database) -> Self {
        Self {
            id: None,
            updated_at: None,
            saves: 0,
            table: "posts".to_string(),
            disk: None,
            locale: None,
            slots: FileSlots::new(),
            db: db.clone(),
        }
    }

    /// Post that always stores its files on the `public` disk
    pub fn public(db: &Database) -> Self {
        Self {
            disk: Some("public".to_string()),
            ..Self::new(db)
        }
    }

    /// Post whose `document` slot is stored in `_{locale}` suffixed columns
    pub fn translatable(db: &Database) -> Self {
        Self {
            table: "underscore_translatable_posts".to_string(),
            locale: Some(UnderscoreLocale::new(
                ["document", "document_filename", "document_mime"],
                "en",
            )),
            ..Self::new(db)
        }
    }

    pub fn set_locale(&mut self, locale: &str) {
        if let Some(resolver) = self.locale.as_mut() {
            resolver.set_locale(locale);
        }
    }

    /// Insert the record with the `document` slot filled in
    pub async fn with_document(
        mut self,
        present: bool,
        filename: Option<&str>,
        mime: Option<&str>,
    ) -> Self {
        let columns = SlotColumns::resolve("document", self.locale_columns());
        self.slots.insert(
            columns,
            FileSlot {
                present,
                filename: filename.map(str::to_string),
                mime: mime.map(str::to_string),
            },
        );
        self.save().await.unwrap();
        self
    }

    pub fn key_string(&self) -> String {
        self.id.expect("record has no id").to_string()
    }
}

#[async_trait]
impl Record for Post {
    fn table(&self) -> &str {
        &self.table
    }

    fn key(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }

    fn exists(&self) -> bool {
        self.id.is_some()
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn file_slots(&self) -> &FileSlots {
        &self.slots
    }

    fn file_slots_mut(&mut self) -> &mut FileSlots {
        &mut self.slots
    }

    async fn save(&mut self) -> Result<(), FilesError> {
        let (id, updated_at) = self.db.write(&self.table, self.id, &self.slots);
        self.id = Some(id);
        self.updated_at = Some(updated_at);
        self.saves += 1;
        Ok(())
    }

    fn locale_columns(&self) -> Option<&dyn LocaleColumnResolver> {
        self.locale.as_ref().map(|l| l as &dyn LocaleColumnResolver)
    }

    fn file_disk(&self) -> Option<&str> {
        self.disk.as_deref()
    }
}

/// Attachment helper over two faked disks
pub struct TestFiles {
    pub attachments: FileAttachments,
    pub local: MemoryDisk,
    pub public: MemoryDisk,
    pub db: Database,
}

pub fn setup() -> TestFiles {
    init_tracing();

    let config = FilesConfig::new("local", "http://localhost")
        .with_disk(DiskConfig::memory("local", "/storage"))
        .with_disk(DiskConfig::memory("public", "/storage"));

    let disks = DiskManager::new();
    let local = disks.fake("local");
    let public = disks.fake("public");

    TestFiles {
        attachments: FileAttachments::new(disks, config),
        local,
        public,
        db: Database::new(),
    }
}

/// Disk where every write and delete fails
pub struct BrokenDisk;

#[async_trait]
impl Disk for BrokenDisk {
    async fn put_as(
        &self,
        _folder: &str,
        _name: &str,
        _data: Bytes,
        _options: &PutOptions,
    ) -> DiskResult<String> {
        Err(DiskError::UploadFailed("disk is read-only".to_string()))
    }

    async fn get(&self, key: &str) -> DiskResult<Bytes> {
        Err(DiskError::NotFound(key.to_string()))
    }

    async fn delete(&self, _key: &str) -> DiskResult<bool> {
        Err(DiskError::DeleteFailed("disk is read-only".to_string()))
    }

    async fn exists(&self, _key: &str) -> DiskResult<bool> {
        Ok(false)
    }

    fn url(&self, key: &str) -> DiskResult<String> {
        Ok(format!("/broken/{}", key))
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
