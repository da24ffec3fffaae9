//! Pure Rust image processing backend over the `image` crate.
//!
//! ## Crate mapping
//!
//! | Stage | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::into_decoder` header + EXIF orientation |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with content sniffing, then `apply_orientation` |
//! | Scale / crop | `DynamicImage::crop_imm` + `resize_exact` with `Lanczos3` |
//! | Letterbox | `RgbaImage::from_pixel` canvas + `imageops::overlay` |
//! | Encode → JPEG | alpha flattened onto black, `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Encode → PNG / WebP | `image` lossless encoders (quality ignored) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, Quality, Region, RenderPlan};
use crate::types::SourceFile;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{
    DynamicImage, ImageDecoder, ImageFormat, ImageReader, Rgb, RgbImage, Rgba, RgbaImage,
};
use std::io::Cursor;
use std::sync::LazyLock;

/// Largest canvas the backend will allocate (width × height).
pub const MAX_CANVAS_PIXELS: u64 = 100_000_000;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-stage mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Refuse canvases that are empty or too large to allocate.
fn check_canvas(width: u32, height: u32) -> Result<(), BackendError> {
    if width == 0 || height == 0 {
        return Err(BackendError::Render(format!(
            "cannot draw onto an empty {width}x{height} canvas"
        )));
    }
    if width as u64 * height as u64 > MAX_CANVAS_PIXELS {
        return Err(BackendError::Render(format!(
            "canvas {width}x{height} exceeds {MAX_CANVAS_PIXELS} pixels"
        )));
    }
    Ok(())
}

fn check_region(image: &DynamicImage, region: &Region) -> Result<(), BackendError> {
    let fits = region.width > 0
        && region.height > 0
        && region.x as u64 + region.width as u64 <= image.width() as u64
        && region.y as u64 + region.height as u64 <= image.height() as u64;
    if fits {
        Ok(())
    } else {
        Err(BackendError::Render(format!(
            "region {region:?} lies outside the {}x{} source",
            image.width(),
            image.height()
        )))
    }
}

/// Scale to exactly `width × height`, skipping the filter when nothing changes.
fn scale(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        image.clone()
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }
}

/// Sniff the format from the bytes and open a decoder past the header.
fn open_decoder(source: &SourceFile) -> Result<impl ImageDecoder + '_, BackendError> {
    let reader = ImageReader::new(Cursor::new(source.bytes.as_slice()))
        .with_guessed_format()
        .map_err(BackendError::Io)?;
    if reader.format().is_none() {
        return Err(BackendError::Decode(format!(
            "{} is not in a recognized image format",
            source.name
        )));
    }
    reader
        .into_decoder()
        .map_err(|e| BackendError::Decode(format!("failed to read {} header: {e}", source.name)))
}

/// Orientation recorded in the file's EXIF, if any.
fn read_orientation(decoder: &mut impl ImageDecoder) -> Orientation {
    decoder.orientation().unwrap_or(Orientation::NoTransforms)
}

/// Stored dimensions as displayed once `orientation` is applied.
fn oriented_dimensions((width, height): (u32, u32), orientation: Orientation) -> Dimensions {
    match orientation {
        Orientation::Rotate90
        | Orientation::Rotate270
        | Orientation::Rotate90FlipH
        | Orientation::Rotate270FlipH => Dimensions {
            width: height,
            height: width,
        },
        _ => Dimensions { width, height },
    }
}

/// JPEG has no alpha channel: composite onto black, as a canvas export does.
fn flatten_onto_black(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let over = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
        Rgb([over(r), over(g), over(b)])
    })
}

fn encode_jpeg(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
    flatten_onto_black(image)
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buf.into_inner())
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| BackendError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(buf.into_inner())
}

/// The `image` crate only ships a lossless WebP encoder, so quality is ignored.
fn encode_webp(image: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = WebPEncoder::new_lossless(&mut buf);
    image
        .to_rgba8()
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("WebP encode failed: {e}")))?;
    Ok(buf.into_inner())
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &SourceFile) -> Result<Dimensions, BackendError> {
        let mut decoder = open_decoder(source)?;
        let orientation = read_orientation(&mut decoder);
        let dims = oriented_dimensions(decoder.dimensions(), orientation);
        if dims.width == 0 || dims.height == 0 {
            return Err(BackendError::Decode(format!(
                "{} has an empty {}x{} header",
                source.name, dims.width, dims.height
            )));
        }
        Ok(dims)
    }

    fn decode(&self, source: &SourceFile) -> Result<DynamicImage, BackendError> {
        let mut decoder = open_decoder(source)?;
        let orientation = read_orientation(&mut decoder);
        let mut image = DynamicImage::from_decoder(decoder).map_err(|e| {
            BackendError::Decode(format!("failed to decode {}: {e}", source.name))
        })?;
        image.apply_orientation(orientation);
        if image.width() == 0 || image.height() == 0 {
            return Err(BackendError::Decode(format!(
                "{} decoded to an empty image",
                source.name
            )));
        }
        Ok(image)
    }

    fn render(&self, image: &DynamicImage, plan: &RenderPlan) -> Result<DynamicImage, BackendError> {
        let (width, height) = plan.canvas();
        check_canvas(width, height)?;

        match *plan {
            RenderPlan::Scale { width, height } => Ok(scale(image, width, height)),
            RenderPlan::Cover {
                region,
                width,
                height,
            } => {
                check_region(image, &region)?;
                let cropped = image.crop_imm(region.x, region.y, region.width, region.height);
                Ok(scale(&cropped, width, height))
            }
            RenderPlan::Contain {
                placement,
                width,
                height,
                fill,
            } => {
                check_canvas(placement.width, placement.height)?;
                let [r, g, b] = fill;
                let mut canvas = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]));
                let scaled = scale(image, placement.width, placement.height).to_rgba8();
                image::imageops::overlay(
                    &mut canvas,
                    &scaled,
                    placement.x as i64,
                    placement.y as i64,
                );
                Ok(DynamicImage::ImageRgba8(canvas))
            }
        }
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let bytes = match format {
            OutputFormat::Jpeg => encode_jpeg(image, quality)?,
            OutputFormat::Png => encode_png(image)?,
            OutputFormat::WebP => encode_webp(image)?,
        };
        if bytes.is_empty() {
            return Err(BackendError::Encode(format!(
                "{} encoder produced no output",
                format.mime_type()
            )));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::calculations::calculate_resize_plan;
    use crate::imaging::params::FitMode;
    use crate::test_helpers::{jpeg_source, png_source, rotated_jpeg_source, solid_image};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = super::supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn decode_synthetic_jpeg() {
        let backend = RustBackend::new();
        let image = backend.decode(&jpeg_source("a.jpg", 200, 150)).unwrap();
        assert_eq!((image.width(), image.height()), (200, 150));
    }

    #[test]
    fn decode_applies_exif_orientation() {
        // Stored landscape, tagged Orientation=6 (rotate 90° clockwise to display)
        let source = rotated_jpeg_source("portrait.jpg", 40, 30, 6);
        let image = RustBackend::new().decode(&source).unwrap();
        assert_eq!((image.width(), image.height()), (30, 40));
    }

    #[test]
    fn identify_reports_upright_dimensions() {
        let backend = RustBackend::new();
        assert_eq!(
            backend
                .identify(&rotated_jpeg_source("p.jpg", 40, 30, 6))
                .unwrap(),
            Dimensions {
                width: 30,
                height: 40
            }
        );
        // Orientation=3 is a half turn: axes unchanged
        assert_eq!(
            backend
                .identify(&rotated_jpeg_source("u.jpg", 40, 30, 3))
                .unwrap(),
            Dimensions {
                width: 40,
                height: 30
            }
        );
        assert_eq!(
            backend.identify(&png_source("a.png", 30, 20)).unwrap(),
            Dimensions {
                width: 30,
                height: 20
            }
        );
    }

    #[test]
    fn identify_garbage_errors() {
        let source = SourceFile::new("junk.png", "image/png", b"not a header".to_vec());
        let result = RustBackend::new().identify(&source);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn oriented_dimensions_swaps_quarter_turns() {
        let stored = (4000, 3000);
        let portrait = Dimensions {
            width: 3000,
            height: 4000,
        };
        assert_eq!(oriented_dimensions(stored, Orientation::Rotate90), portrait);
        assert_eq!(oriented_dimensions(stored, Orientation::Rotate270FlipH), portrait);
        assert_eq!(
            oriented_dimensions(stored, Orientation::FlipHorizontal),
            Dimensions::from(stored)
        );
    }

    #[test]
    fn decode_sniffs_content_not_declared_type() {
        // PNG bytes declared as JPEG still decode
        let mut source = png_source("a.png", 30, 20);
        source.mime_type = "image/jpeg".to_string();
        let image = RustBackend::new().decode(&source).unwrap();
        assert_eq!((image.width(), image.height()), (30, 20));
    }

    #[test]
    fn decode_garbage_errors() {
        let source = SourceFile::new("junk.jpg", "image/jpeg", b"definitely not pixels".to_vec());
        let result = RustBackend::new().decode(&source);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn render_scale_exact_size() {
        let image = solid_image(400, 300, [10, 200, 30]);
        let out = RustBackend::new()
            .render(
                &image,
                &RenderPlan::Scale {
                    width: 200,
                    height: 150,
                },
            )
            .unwrap();
        assert_eq!((out.width(), out.height()), (200, 150));
    }

    #[test]
    fn render_cover_is_full_bleed() {
        let image = solid_image(160, 90, [220, 20, 20]);
        let plan = calculate_resize_plan((160, 90), (64, 64), FitMode::Cover);
        let out = RustBackend::new().render(&image, &plan).unwrap().to_rgb8();

        assert_eq!(out.dimensions(), (64, 64));
        for pixel in out.pixels() {
            assert!(pixel[0] > 200, "letterbox pixel found in cover output: {pixel:?}");
        }
    }

    #[test]
    fn render_contain_letterboxes_with_black() {
        // 200x100 into 100x100 → content 100x50 at y=25
        let image = solid_image(200, 100, [220, 20, 20]);
        let plan = calculate_resize_plan((200, 100), (100, 100), FitMode::Contain);
        let out = RustBackend::new().render(&image, &plan).unwrap().to_rgb8();

        assert_eq!(out.dimensions(), (100, 100));
        for y in 0..25 {
            assert_eq!(out.get_pixel(50, y).0, [0, 0, 0]);
            assert_eq!(out.get_pixel(50, 99 - y).0, [0, 0, 0]);
        }
        assert!(out.get_pixel(50, 50)[0] > 200);
        assert!(out.get_pixel(0, 30)[0] > 200);
    }

    #[test]
    fn render_rejects_empty_canvas() {
        let image = solid_image(10, 10, [0, 0, 0]);
        let result = RustBackend::new().render(
            &image,
            &RenderPlan::Scale {
                width: 0,
                height: 10,
            },
        );
        assert!(matches!(result, Err(BackendError::Render(_))));
    }

    #[test]
    fn render_rejects_region_outside_source() {
        let image = solid_image(10, 10, [0, 0, 0]);
        let plan = RenderPlan::Cover {
            region: Region {
                x: 5,
                y: 0,
                width: 10,
                height: 10,
            },
            width: 4,
            height: 4,
        };
        let result = RustBackend::new().render(&image, &plan);
        assert!(matches!(result, Err(BackendError::Render(_))));
    }

    #[test]
    fn encode_jpeg_magic_and_quality() {
        let backend = RustBackend::new();
        let image = crate::test_helpers::noisy_image(128, 128);

        let high = backend
            .encode(&image, OutputFormat::Jpeg, Quality::new(95))
            .unwrap();
        let low = backend
            .encode(&image, OutputFormat::Jpeg, Quality::new(20))
            .unwrap();

        assert_eq!(&high[0..2], &[0xFF, 0xD8]);
        assert!(low.len() < high.len(), "{} !< {}", low.len(), high.len());
    }

    #[test]
    fn encode_png_and_webp_magic() {
        let backend = RustBackend::new();
        let image = solid_image(10, 10, [1, 2, 3]);

        let png = backend
            .encode(&image, OutputFormat::Png, Quality::default())
            .unwrap();
        assert_eq!(&png[0..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);

        let webp = backend
            .encode(&image, OutputFormat::WebP, Quality::default())
            .unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
    }

    #[test]
    fn encode_jpeg_flattens_transparency_onto_black() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 0])));
        let bytes = RustBackend::new()
            .encode(&image, OutputFormat::Jpeg, Quality::new(95))
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let pixel = decoded.get_pixel(8, 8);
        assert!(pixel.0.iter().all(|&c| c < 10), "expected black, got {pixel:?}");
    }

    #[test]
    fn flatten_blends_partial_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, 128])));
        assert_eq!(flatten_onto_black(&image).get_pixel(0, 0).0, [100, 50, 0]);

        let opaque = solid_image(1, 1, [200, 100, 0]);
        assert_eq!(flatten_onto_black(&opaque).get_pixel(0, 0).0, [200, 100, 0]);
    }
}
