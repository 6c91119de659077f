//! Shared key helpers for disk backends.
//!
//! Key format: `{folder}/{name}`, e.g. `posts/document/5.pdf`.

use crate::traits::{DiskError, DiskResult};

/// Join a folder and a file name into a key.
pub fn file_key(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Reject keys that are empty, absolute or could escape the disk root.
pub fn validate_key(key: &str) -> DiskResult<()> {
    if key.is_empty() {
        return Err(DiskError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(DiskError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Build a public URL from a base URL and a key.
pub(crate) fn join_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}
