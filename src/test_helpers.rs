//! Shared test utilities for the moments-media test suite.
//!
//! Builds synthetic rasters and in-memory encoded uploads so unit tests never
//! need fixture files on disk.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let upload = jpeg_source("beach.jpg", 800, 600);
//! let info = get_image_info(&RustBackend::new(), &upload).unwrap();
//! assert_eq!((info.width, info.height), (800, 600));
//! ```

use crate::types::SourceFile;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

// =========================================================================
// Rasters
// =========================================================================

/// A single-colour RGB raster.
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

/// A smooth gradient: compresses well, like most photos.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

/// Hash-scrambled pixels: barely compresses at any JPEG quality.
pub fn noisy_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let mut h = x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B);
        h ^= h >> 15;
        h = h.wrapping_mul(0x2C1B_3C6D);
        h ^= h >> 12;
        Rgb([h as u8, (h >> 8) as u8, (h >> 16) as u8])
    }))
}

// =========================================================================
// Encoded uploads
// =========================================================================

/// Encode `image` as a JPEG upload.
pub fn jpeg_upload(name: &str, image: &DynamicImage) -> SourceFile {
    let mut buf = Cursor::new(Vec::new());
    image
        .to_rgb8()
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 90))
        .unwrap();
    SourceFile::new(name, "image/jpeg", buf.into_inner())
}

/// A gradient JPEG upload with the given dimensions.
pub fn jpeg_source(name: &str, width: u32, height: u32) -> SourceFile {
    jpeg_upload(name, &gradient_image(width, height))
}

/// A gradient PNG upload with the given dimensions.
pub fn png_source(name: &str, width: u32, height: u32) -> SourceFile {
    let mut buf = Cursor::new(Vec::new());
    gradient_image(width, height)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    SourceFile::new(name, "image/png", buf.into_inner())
}

/// Splice an EXIF APP1 segment carrying `orientation` in after the JPEG SOI.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let [lo, hi] = orientation.to_le_bytes();
    let mut payload = b"Exif\0\0".to_vec();
    // Little-endian TIFF header, IFD at offset 8 with a single SHORT entry
    payload.extend_from_slice(&[b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]);
    payload.extend_from_slice(&[0x01, 0x00]);
    payload.extend_from_slice(&[0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00]);
    payload.extend_from_slice(&[lo, hi, 0x00, 0x00]);
    payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

    let length = (payload.len() + 2) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A gradient JPEG stored at `width × height` and tagged with an EXIF
/// orientation, like a phone photo taken in portrait.
pub fn rotated_jpeg_source(name: &str, width: u32, height: u32, orientation: u16) -> SourceFile {
    let plain = jpeg_source(name, width, height);
    SourceFile::new(
        name,
        "image/jpeg",
        with_exif_orientation(&plain.bytes, orientation),
    )
}

/// An upload whose bytes are irrelevant; only the declared metadata matters.
pub fn declared_upload(name: &str, mime_type: &str, size: usize) -> SourceFile {
    SourceFile::new(name, mime_type, vec![0u8; size])
}
