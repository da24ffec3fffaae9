//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what raster to produce) and the [`backend`](super::backend)
//! (which does the actual pixel work). Every option struct has a `Default`
//! carrying the documented upload defaults, so callers only override the
//! fields they care about.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality, stored as a whole percentage (1–100).
//! - [`OutputFormat`] — Encoded output MIME type (JPEG, PNG, WebP).
//! - [`FitMode`] — How an exact-size resize treats a mismatched aspect ratio.
//! - [`CompressionOptions`] / [`ResizeOptions`] / [`ValidationOptions`] — per-call option bags.
//! - [`Preset`] — The two upload profiles used by the app (moment photos, profile pictures).
//! - [`RenderPlan`] / [`Region`] — Fully resolved geometry for one draw onto a fresh canvas.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding, as a percentage (1-100).
///
/// Kept as an integer so the quality search steps by exactly 10 points and
/// compares against the 50% floor without float drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u32);

impl Quality {
    /// Amount removed per quality-search step.
    pub const STEP: u32 = 10;
    /// The search only reduces quality while it is strictly above this value.
    pub const FLOOR: Quality = Quality(50);

    pub fn new(percent: u32) -> Self {
        Self(percent.clamp(1, 100))
    }

    /// Build from a `(0, 1]` fraction, e.g. `0.85` → 85%.
    pub fn from_fraction(fraction: f64) -> Self {
        // NaN and negatives saturate to 0 in the cast and clamp up to 1.
        Self::new((fraction * 100.0).round() as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn as_fraction(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Whether the quality search may take another step down.
    pub fn can_reduce(self) -> bool {
        self > Self::FLOOR
    }

    pub fn reduced(self) -> Self {
        Self::new(self.0.saturating_sub(Self::STEP))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_fraction())
    }
}

/// Encoded output format, named by its MIME type in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    WebP,
}

impl OutputFormat {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// File extension given to encoded outputs.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    /// Accepts a MIME type or a bare extension (`jpeg`, `jpg`, `png`, `webp`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(format) = Self::from_mime(s) {
            return Ok(format);
        }
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            other => Err(format!("unsupported output format: {other}")),
        }
    }
}

/// How [`resize_image`](super::operations::resize_image) fills an exact canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Crop the source symmetrically so it fills the whole canvas.
    #[default]
    Cover,
    /// Scale the whole source into the canvas and letterbox the rest.
    Contain,
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cover" => Ok(Self::Cover),
            "contain" => Ok(Self::Contain),
            other => Err(format!("unknown fit mode: {other} (expected cover or contain)")),
        }
    }
}

/// Options for [`compress_image`](super::operations::compress_image).
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOptions {
    /// Upper bound on output width in pixels.
    pub max_width: u32,
    /// Upper bound on output height in pixels.
    pub max_height: u32,
    /// Starting encoder quality for the size search.
    pub quality: Quality,
    /// Best-effort size budget in megabytes (1 MB = 1024 × 1024 bytes).
    pub max_size_mb: f64,
    pub format: OutputFormat,
    /// Scale uniformly when true; clamp each axis independently when false.
    pub maintain_aspect_ratio: bool,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1920,
            quality: Quality::new(85),
            max_size_mb: 1.5,
            format: OutputFormat::Jpeg,
            maintain_aspect_ratio: true,
        }
    }
}

/// Options for [`resize_image`](super::operations::resize_image).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    pub fit: FitMode,
    pub quality: Quality,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            fit: FitMode::Cover,
            quality: Quality::new(92),
        }
    }
}

/// Options for [`validate_image`](super::operations::validate_image).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOptions {
    /// Maximum encoded size in bytes.
    pub max_size: u64,
    /// MIME types accepted by the allow-list check.
    pub allowed_types: Vec<String>,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_size: 10 * 1024 * 1024,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            max_width: 8192,
            max_height: 8192,
        }
    }
}

/// Upload profiles used by the storage layer before it hands bytes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Photos attached to a moment: 1920px box, 1.5 MB budget.
    Moment,
    /// Avatars: 512px box, 100 KB budget.
    Profile,
}

impl Preset {
    pub fn compression_options(self) -> CompressionOptions {
        match self {
            Self::Moment => CompressionOptions::default(),
            Self::Profile => CompressionOptions {
                max_width: 512,
                max_height: 512,
                quality: Quality::new(80),
                max_size_mb: 0.1,
                ..CompressionOptions::default()
            },
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "moment" => Ok(Self::Moment),
            "profile" => Ok(Self::Profile),
            other => Err(format!("unknown preset: {other} (expected moment or profile)")),
        }
    }
}

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A single draw of a decoded source onto a freshly allocated canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPlan {
    /// Scale the whole source onto a `width × height` canvas.
    Scale { width: u32, height: u32 },
    /// Cut `region` out of the source and stretch it over the whole canvas.
    Cover {
        region: Region,
        width: u32,
        height: u32,
    },
    /// Draw the whole source into `placement`; everything else is `fill`.
    Contain {
        placement: Region,
        width: u32,
        height: u32,
        fill: [u8; 3],
    },
}

impl RenderPlan {
    /// Letterbox colour used by contain-mode resizes.
    pub const LETTERBOX: [u8; 3] = [0, 0, 0];

    /// Canvas size this plan produces.
    pub fn canvas(&self) -> (u32, u32) {
        match *self {
            Self::Scale { width, height }
            | Self::Cover { width, height, .. }
            | Self::Contain { width, height, .. } => (width, height),
        }
    }
}
