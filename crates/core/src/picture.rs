//! Profile picture naming.

use rand::RngCore;
use std::path::Path;

/// Number of random bytes in a stored picture name (hex-encoded to twice as many chars).
const NAME_BYTES: usize = 16;

/// Longest file extension carried over from the client's filename.
const MAX_EXTENSION_LEN: usize = 10;

/// Storage key of an uploaded picture: random hex plus the original extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PictureKey(String);

impl PictureKey {
    /// Generate a fresh key for an upload with the given client filename.
    ///
    /// The extension is kept only if it is short and ASCII alphanumeric; the
    /// rest of the client filename is discarded.
    pub fn generate(original_filename: Option<&str>) -> Self {
        let mut bytes = [0u8; NAME_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let stem = hex::encode(bytes);

        match original_filename.and_then(sanitized_extension) {
            Some(ext) => Self(format!("{stem}.{ext}")),
            None => Self(stem),
        }
    }

    /// Get the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PictureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn sanitized_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Content type for a stored picture, derived from its extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
