//! Attachment helper
//!
//! [`FileAttachments`] is created once per application from the disk
//! registry and the configuration. [`FileAttachments::on`] borrows a record
//! and returns an [`AttachedFiles`] handle exposing the slot operations.
//!
//! Paths follow `{table}/{column}/{key}.{extension}`. The column segment is
//! the resolved column, so translated slots are stored per locale
//! (`posts/document_en/5.pdf`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tether_core::{FilesConfig, FilesError};
use tether_storage::{create_disks, Disk, DiskManager, PutOptions};

use crate::error::{AttachmentError, AttachmentResult};
use crate::record::Record;
use crate::slots::{FileSlot, SlotColumns};
use crate::upload::UploadedFile;

/// Entry point for file slot operations
#[derive(Debug, Clone)]
pub struct FileAttachments {
    disks: DiskManager,
    config: Arc<FilesConfig>,
}

impl FileAttachments {
    pub fn new(disks: DiskManager, config: FilesConfig) -> Self {
        Self {
            disks,
            config: Arc::new(config),
        }
    }

    /// Validate the configuration and build every declared disk
    pub async fn from_config(config: FilesConfig) -> AttachmentResult<Self> {
        config.validate()?;
        let disks = create_disks(&config).await?;
        Ok(Self::new(disks, config))
    }

    pub fn disks(&self) -> &DiskManager {
        &self.disks
    }

    pub fn config(&self) -> &FilesConfig {
        &self.config
    }

    /// Operate on the file slots of `record`
    pub fn on<'a, R: Record>(&'a self, record: &'a mut R) -> AttachedFiles<'a, R> {
        AttachedFiles {
            attachments: self,
            record,
            disk: None,
        }
    }
}

/// File slot operations bound to one record
pub struct AttachedFiles<'a, R> {
    attachments: &'a FileAttachments,
    record: &'a mut R,
    disk: Option<String>,
}

impl<'a, R: Record> AttachedFiles<'a, R> {
    /// Use `disk` for the following operations instead of the record's or the default disk
    pub fn using_file_disk(mut self, disk: impl Into<String>) -> Self {
        self.disk = Some(disk.into());
        self
    }

    /// Name of the disk the operations target
    pub fn file_disk(&self) -> &str {
        self.disk
            .as_deref()
            .or_else(|| self.record.file_disk())
            .unwrap_or(self.attachments.config.default_disk.as_str())
    }

    pub fn record(&self) -> &R {
        &*self.record
    }

    fn disk(&self) -> AttachmentResult<Arc<dyn Disk>> {
        Ok(self.attachments.disks.disk(self.file_disk())?)
    }

    fn columns(&self, column: &str) -> SlotColumns {
        SlotColumns::resolve(column, self.record.locale_columns())
    }

    fn slot(&self, column: &str) -> Option<&FileSlot> {
        let columns = self.columns(column);
        self.record.file_slots().get(&columns)
    }

    fn slot_mut(&mut self, column: &str) -> &mut FileSlot {
        let columns = self.columns(column);
        self.record.file_slots_mut().get_mut(&columns)
    }

    fn stored_slot(&self, column: &str) -> Option<&FileSlot> {
        self.slot(column).filter(|slot| slot.present)
    }

    pub fn has_file(&self, column: &str) -> bool {
        self.stored_slot(column).is_some()
    }

    pub fn set_has_file(&mut self, column: &str, present: bool) {
        self.slot_mut(column).present = present;
    }

    /// Original file name, including the stored extension
    pub fn file_name(&self, column: &str) -> Option<String> {
        self.stored_slot(column)?.filename.clone()
    }

    pub fn set_file_name(&mut self, column: &str, filename: Option<String>) {
        self.slot_mut(column).filename = filename;
    }

    pub fn file_mime(&self, column: &str) -> Option<String> {
        self.stored_slot(column)?.mime.clone()
    }

    pub fn set_file_mime(&mut self, column: &str, mime: Option<String>) {
        self.slot_mut(column).mime = mime;
    }

    /// Extension of the stored file name, or `default` when there is none
    pub fn file_extension(&self, column: &str, default: Option<&str>) -> Option<String> {
        self.slot(column)
            .and_then(FileSlot::extension)
            .or(default)
            .map(str::to_string)
    }

    pub fn folder_path(&self, column: &str) -> String {
        format!("{}/{}", self.record.table(), self.columns(column).presence)
    }

    /// Key of the stored blob, `None` when the slot is empty
    ///
    /// The dot is always written, so a file name without extension maps to `{key}.`
    pub fn file_path(&self, column: &str) -> Option<String> {
        if !self.has_file(column) {
            return None;
        }
        let key = self.record.key()?;
        let extension = self.file_extension(column, None).unwrap_or_default();
        Some(format!("{}/{}.{}", self.folder_path(column), key, extension))
    }

    /// Public URL of the stored file
    pub fn file_url(&self, column: &str) -> AttachmentResult<Option<String>> {
        let Some(path) = self.file_path(column) else {
            return Ok(None);
        };
        let url = self.disk()?.url(&path)?;
        Ok(Some(self.absolute_url(url)))
    }

    /// Public URL suffixed with `?t={updated_at}` so it changes whenever the record is saved
    pub fn versioned_file_url(&self, column: &str) -> AttachmentResult<Option<String>> {
        let Some(url) = self.file_url(column)? else {
            return Ok(None);
        };
        let timestamp = self
            .record
            .updated_at()
            .map(|at| at.timestamp().to_string())
            .unwrap_or_default();
        Ok(Some(format!("{}?t={}", url, timestamp)))
    }

    /// URL granting access for `expires_in`; disks without signing return the public URL
    pub async fn temporary_file_url(
        &self,
        column: &str,
        expires_in: Duration,
    ) -> AttachmentResult<Option<String>> {
        let Some(path) = self.file_path(column) else {
            return Ok(None);
        };
        let url = self.disk()?.temporary_url(&path, expires_in).await?;
        Ok(Some(self.absolute_url(url)))
    }

    fn absolute_url(&self, url: String) -> String {
        if url.contains("://") {
            return url;
        }
        format!(
            "{}/{}",
            self.attachments.config.app_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }

    /// Absolute local path of the stored file; only local disks support it
    pub fn file_path_on_disk(&self, column: &str) -> AttachmentResult<Option<PathBuf>> {
        match self.file_path(column) {
            Some(path) => Ok(Some(self.disk()?.path(&path)?)),
            None => Ok(None),
        }
    }

    /// Whether the blob of a stored file is present on the disk
    pub async fn file_exists(&self, column: &str) -> AttachmentResult<bool> {
        match self.file_path(column) {
            Some(path) => Ok(self.disk()?.exists(&path).await?),
            None => Ok(false),
        }
    }

    fn persisted_key(&self) -> AttachmentResult<String> {
        if !self.record.exists() {
            return Err(FilesError::ModelNotPersisted.into());
        }
        self.record
            .key()
            .ok_or_else(|| AttachmentError::Files(FilesError::ModelNotPersisted))
    }

    /// Store `upload` in `column` with default write options
    pub async fn store_file(
        self,
        column: &str,
        upload: &UploadedFile,
    ) -> AttachmentResult<&'a mut R> {
        self.store_file_with(column, upload, PutOptions::new())
            .await
    }

    /// Write the upload to the disk, fill the slot and save the record
    ///
    /// The extension comes from the upload content, so `photo.jpeg` is stored
    /// as `{key}.jpg` with file name `photo.jpg`. When the previous file of the
    /// slot had another extension its blob is removed from the disk.
    pub async fn store_file_with(
        mut self,
        column: &str,
        upload: &UploadedFile,
        options: PutOptions,
    ) -> AttachmentResult<&'a mut R> {
        let key = self.persisted_key()?;
        let disk = self.disk()?;

        let extension = upload.detected_extension();
        let mime = upload.mime();
        let folder = self.folder_path(column);
        let previous = self.file_path(column);

        let options = if options.content_type.is_some() {
            options
        } else {
            options.content_type(mime.clone())
        };

        let start = Instant::now();
        let path = disk
            .put_as(
                &folder,
                &format!("{}.{}", key, extension),
                upload.bytes().clone(),
                &options,
            )
            .await?;

        if let Some(previous) = previous.filter(|p| *p != path) {
            if let Err(e) = disk.delete(&previous).await {
                tracing::warn!(
                    error = %e,
                    path = %previous,
                    "Failed to remove previous file"
                );
            }
        }

        let columns = self.columns(column);
        self.record.file_slots_mut().insert(
            columns,
            FileSlot::stored(format!("{}.{}", upload.base_name(), extension), mime),
        );
        self.record.save().await?;

        tracing::info!(
            table = %self.record.table(),
            column = %column,
            key = %key,
            disk = %self.file_disk(),
            path = %path,
            size_bytes = upload.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "File stored"
        );

        Ok(self.record)
    }

    /// Remove the blob, clear the slot and save the record
    ///
    /// The slot is cleared and saved even when the disk delete fails; the
    /// disk error is returned afterwards.
    pub async fn delete_file(mut self, column: &str) -> AttachmentResult<&'a mut R> {
        let key = self.persisted_key()?;

        let mut disk_error = None;
        if let Some(path) = self.file_path(column) {
            let disk = self.disk()?;
            match disk.delete(&path).await {
                Ok(removed) => {
                    tracing::info!(
                        table = %self.record.table(),
                        column = %column,
                        key = %key,
                        disk = %self.file_disk(),
                        path = %path,
                        removed,
                        "File deleted"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        disk = %self.file_disk(),
                        path = %path,
                        "Failed to delete file from disk"
                    );
                    disk_error = Some(e);
                }
            }
        }

        self.slot_mut(column).clear();
        self.record.save().await?;

        match disk_error {
            Some(e) => Err(e.into()),
            None => Ok(self.record),
        }
    }
}
