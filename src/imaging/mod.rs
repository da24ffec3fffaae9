//! Image processing — pure Rust, no system codecs.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | decoder header + EXIF orientation, no pixel decode |
//! | **Decode** | `image::ImageReader` with format sniffing, EXIF orientation applied |
//! | **Compress** | Lanczos3 fit + quality search over the encoder |
//! | **Resize (cover)** | `crop_imm` + Lanczos3 |
//! | **Resize (contain)** | Lanczos3 + `imageops::overlay` on a black canvas |
//! | **Encode** | JPEG / PNG / lossless WebP |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    BYTES_PER_MB, calculate_contain_placement, calculate_cover_region, calculate_fit_dimensions,
    exceeds_budget, format_megabytes,
};
pub use operations::{
    CompressedImage, compress_image, compress_images, get_image_info, output_file_name,
    prepare_upload, prepare_uploads, resize_image, validate_image,
};
pub use params::{
    CompressionOptions, FitMode, OutputFormat, Preset, Quality, Region, RenderPlan, ResizeOptions,
    ValidationOptions,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
