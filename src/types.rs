//! Shared types passed into and out of the imaging operations.
//!
//! A [`SourceFile`] is the input contract (bytes + declared MIME type +
//! original name); an [`EncodedFile`] has the same shape and is what every
//! transform returns. Both are request-scoped values: nothing here is cached
//! or persisted.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// MIME type given to files whose extension names no known image format.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// An uploaded file as handed to the imaging layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Original filename, used to derive output names.
    pub name: String,
    /// Declared MIME type. Trusted for the image-type checks; the bytes are
    /// still sniffed again at decode time.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its MIME type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, mime_type_for_path(path), bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the declared MIME type is an `image/*` type.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Declared MIME type for a path, from its extension.
pub fn mime_type_for_path(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type().to_string())
        .unwrap_or_else(|_| UNKNOWN_MIME.to_string())
}

/// Encoded output of a compress or resize call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl EncodedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Hand the output back in as the input of another operation.
    pub fn into_source(self) -> SourceFile {
        SourceFile::new(self.name, self.mime_type, self.bytes)
    }

    /// Write the bytes to `dir/<name>`, creating `dir` if needed.
    pub fn save(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Decoded metadata of an image, without transforming it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Encoded size in bytes.
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub name: String,
}

/// Outcome of a validation pass. Policy violations are reported here, never
/// as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }
}
