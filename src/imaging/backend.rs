//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait splits every transform into the three stages
//! the operations chain in strict order: **decode** the uploaded bytes,
//! **render** the decoded raster onto a fresh canvas following a
//! [`RenderPlan`], and **encode** the canvas to bytes. **Identify** reads
//! the displayed dimensions from the header alone, for checks that must not
//! pay for (or fail on) a full decode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Operations are written
//! against the trait so the quality search and validation order can be
//! exercised with a scripted mock.

use super::params::{OutputFormat, Quality, RenderPlan};
use crate::types::SourceFile;
use image::DynamicImage;
use thiserror::Error;

/// Failure of an imaging stage.
///
/// The variant names the stage; the message is prefixed with the operation
/// that hit it (see [`BackendError::context`]).
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Not an image, or empty, before any decode was attempted.
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Decode(String),
    /// The output canvas could not be allocated or drawn.
    #[error("{0}")]
    Render(String),
    /// The encoder failed or produced no bytes.
    #[error("{0}")]
    Encode(String),
    /// The file failed validation before an upload was prepared.
    #[error("{0}")]
    Rejected(String),
}

impl BackendError {
    /// Prefix the message with the name of the operation that failed.
    pub fn context(self, operation: &str) -> Self {
        match self {
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), format!("{operation}: {e}"))),
            Self::Input(m) => Self::Input(format!("{operation}: {m}")),
            Self::Decode(m) => Self::Decode(format!("{operation}: {m}")),
            Self::Render(m) => Self::Render(format!("{operation}: {m}")),
            Self::Encode(m) => Self::Encode(format!("{operation}: {m}")),
            Self::Rejected(m) => Self::Rejected(format!("{operation}: {m}")),
        }
    }
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// Each call owns what it returns; nothing is pooled between calls.
pub trait ImageBackend: Sync {
    /// Displayed dimensions from the header, with EXIF orientation applied.
    fn identify(&self, source: &SourceFile) -> Result<Dimensions, BackendError>;

    /// Decode the file's bytes into an upright raster with non-zero dimensions.
    fn decode(&self, source: &SourceFile) -> Result<DynamicImage, BackendError>;

    /// Draw `image` onto a new canvas as described by `plan`.
    fn render(&self, image: &DynamicImage, plan: &RenderPlan) -> Result<DynamicImage, BackendError>;

    /// Serialize a canvas. Never returns an empty buffer.
    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
