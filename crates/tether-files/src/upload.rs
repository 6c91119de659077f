//! Uploaded file handle.
//!
//! The stored extension is derived from the file content (magic bytes), not
//! from the name the client sent. Only when the content is not recognised do
//! we fall back to the declared MIME type and then to the client suffix.

use std::path::Path;

use bytes::Bytes;
use tether_core::FilesError;
use tokio::fs;

const OCTET_STREAM: &str = "application/octet-stream";
const FALLBACK_EXTENSION: &str = "bin";

/// Preferred extension for common MIME types
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/pjpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tif"),
    ("image/svg+xml", "svg"),
    ("image/x-icon", "ico"),
    ("application/pdf", "pdf"),
    ("application/zip", "zip"),
    ("application/octet-stream", "bin"),
    ("application/gzip", "gz"),
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("text/xml", "xml"),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
    ("text/html", "html"),
    ("audio/mpeg", "mp3"),
    ("audio/ogg", "ogg"),
    ("audio/flac", "flac"),
    ("audio/wav", "wav"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "pptx",
    ),
    ("application/vnd.oasis.opendocument.text", "odt"),
    ("application/epub+zip", "epub"),
];

/// Extensions of formats that are zip containers
const ZIP_CONTAINERS: &[&str] = &["docx", "xlsx", "pptx", "odt", "epub", "jar"];

/// MIME type and extension recognised from file content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    pub mime: &'static str,
    pub extension: &'static str,
}

impl Detected {
    const fn new(mime: &'static str, extension: &'static str) -> Self {
        Self { mime, extension }
    }
}

/// Recognise a file from its leading bytes
pub fn sniff(data: &[u8]) -> Option<Detected> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(Detected::new("image/jpeg", "jpg"));
    }
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some(Detected::new("image/png", "png"));
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(Detected::new("image/gif", "gif"));
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some(Detected::new("image/webp", "webp"));
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
        return Some(Detected::new("audio/wav", "wav"));
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return Some(Detected::new("image/tiff", "tif"));
    }
    if data.starts_with(b"%PDF-") {
        return Some(Detected::new("application/pdf", "pdf"));
    }
    if data.starts_with(b"PK\x03\x04") {
        return Some(Detected::new("application/zip", "zip"));
    }
    if data.starts_with(&[0x1F, 0x8B]) {
        return Some(Detected::new("application/gzip", "gz"));
    }
    if data.starts_with(b"ID3")
        || data.starts_with(&[0xFF, 0xFB])
        || data.starts_with(&[0xFF, 0xF3])
        || data.starts_with(&[0xFF, 0xF2])
    {
        return Some(Detected::new("audio/mpeg", "mp3"));
    }
    if data.starts_with(b"OggS") {
        return Some(Detected::new("audio/ogg", "ogg"));
    }
    if data.starts_with(b"fLaC") {
        return Some(Detected::new("audio/flac", "flac"));
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return Some(Detected::new("video/mp4", "mp4"));
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(Detected::new("video/webm", "webm"));
    }
    if data.len() >= 14 && data.starts_with(b"BM") && data[6..10] == [0, 0, 0, 0] {
        return Some(Detected::new("image/bmp", "bmp"));
    }

    let head = &data[..data.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")) {
        return Some(Detected::new("image/svg+xml", "svg"));
    }

    None
}

/// Preferred extension for a MIME type
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime
        .split(';')
        .next()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    MIME_EXTENSIONS
        .iter()
        .find(|(m, _)| *m == essence)
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&essence)
                .and_then(|exts| exts.first())
                .copied()
        })
}

/// Lowercase an extension and fold common aliases (`jpeg` -> `jpg`)
pub fn normalize_extension(extension: &str) -> String {
    match extension.to_lowercase().as_str() {
        "jpeg" | "jpe" | "jfif" => "jpg".to_string(),
        "tiff" => "tif".to_string(),
        "htm" => "html".to_string(),
        other => other.to_string(),
    }
}

/// Whether a client-supplied suffix may be used as a stored extension
///
/// Only plain `[a-z0-9]+` suffixes that map to a known MIME type qualify.
fn is_known_extension(extension: &str) -> bool {
    !extension.is_empty()
        && extension
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && mime_guess::from_ext(extension).first_raw().is_some()
}

/// A file handed to [`crate::AttachedFiles::store_file`]
#[derive(Debug, Clone)]
pub struct UploadedFile {
    client_name: String,
    client_mime: Option<String>,
    data: Bytes,
    detected: Option<Detected>,
}

impl UploadedFile {
    /// An upload with the name and MIME type declared by the client
    pub fn new(
        client_name: impl Into<String>,
        client_mime: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        let client_mime = client_mime.into();
        Self {
            client_name: client_name.into(),
            client_mime: (!client_mime.is_empty()).then_some(client_mime),
            detected: sniff(&data),
            data,
        }
    }

    /// A file read from the local filesystem; its MIME type comes from the content
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, FilesError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                FilesError::InvalidUpload(format!("{} has no file name", path.display()))
            })?
            .to_string();

        let data = Bytes::from(fs::read(path).await?);

        Ok(Self {
            client_name: name,
            client_mime: None,
            detected: sniff(&data),
            data,
        })
    }

    /// Name the client sent, including its extension
    pub fn client_original_name(&self) -> &str {
        &self.client_name
    }

    /// MIME type the client declared
    pub fn client_mime_type(&self) -> Option<&str> {
        self.client_mime.as_deref()
    }

    /// MIME type derived from the content, then from the file name
    pub fn mime_type(&self) -> String {
        if let Some(detected) = self.detected {
            return detected.mime.to_string();
        }
        mime_guess::from_path(&self.client_name)
            .first_raw()
            .unwrap_or(OCTET_STREAM)
            .to_string()
    }

    /// MIME type recorded for the slot: the client's declaration when there is one
    pub fn mime(&self) -> String {
        self.client_mime
            .clone()
            .unwrap_or_else(|| self.mime_type())
    }

    /// Extension to store the file under
    pub fn detected_extension(&self) -> String {
        let client_extension = self
            .client_name
            .rsplit_once('.')
            .map(|(_, ext)| normalize_extension(ext))
            .filter(|ext| is_known_extension(ext));

        match self.detected {
            // docx, xlsx and friends are zip files; keep the declared flavour
            Some(detected) if detected.extension == "zip" => self
                .client_mime
                .as_deref()
                .and_then(extension_for_mime)
                .map(str::to_string)
                .or(client_extension)
                .filter(|ext| ZIP_CONTAINERS.contains(&ext.as_str()))
                .unwrap_or_else(|| "zip".to_string()),
            Some(detected) => detected.extension.to_string(),
            None => self
                .client_mime
                .as_deref()
                .and_then(extension_for_mime)
                .filter(|ext| *ext != FALLBACK_EXTENSION)
                .map(str::to_string)
                .or(client_extension)
                .unwrap_or_else(|| FALLBACK_EXTENSION.to_string()),
        }
    }

    /// Client name without its extension
    pub fn base_name(&self) -> &str {
        match self.client_name.rsplit_once('.') {
            Some((base, _)) if !base.is_empty() => base,
            _ => &self.client_name,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
