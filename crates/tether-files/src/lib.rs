//! Tether Files Library
//!
//! Attaches single files to database records. Each file slot is tracked by
//! three columns on the record (presence flag, original file name, MIME type)
//! while the bytes live on a named disk at `{table}/{column}/{key}.{ext}`.
//!
//! ```ignore
//! let attachments = FileAttachments::from_config(FilesConfig::from_env()?).await?;
//! let upload = UploadedFile::new("report.pdf", "application/pdf", bytes);
//!
//! attachments.on(&mut post).store_file("document", &upload).await?;
//! let url = attachments.on(&mut post).versioned_file_url("document")?;
//! ```

pub mod attachments;
pub mod error;
pub mod locale;
pub mod record;
pub mod slots;
pub mod upload;

pub use attachments::{AttachedFiles, FileAttachments};
pub use error::{AttachmentError, AttachmentResult};
pub use locale::{LocaleColumnResolver, UnderscoreLocale};
pub use record::Record;
pub use slots::{FileSlot, FileSlots, SlotColumns};
pub use upload::{extension_for_mime, normalize_extension, sniff, Detected, UploadedFile};

pub use tether_core::{FilesConfig, FilesError};
pub use tether_storage::{DiskManager, PutOptions, Visibility};
