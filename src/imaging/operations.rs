//! High-level image operations.
//!
//! These functions combine calculations with backend execution. Each one
//! checks its input, resolves geometry with the pure functions in
//! [`calculations`](super::calculations), then runs decode → render → encode
//! on the backend. Errors come back prefixed with the operation name
//! (`compress: …`, `resize: …`) so callers can tell which call failed.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{
    calculate_fit_dimensions, calculate_resize_plan, exceeds_budget, format_megabytes,
};
use super::params::{
    CompressionOptions, OutputFormat, Quality, RenderPlan, ResizeOptions, ValidationOptions,
};
use crate::types::{EncodedFile, ImageInfo, SourceFile, ValidationResult};
use log::{debug, info, warn};
use rayon::prelude::*;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Reject empty and non-image inputs before anything is decoded.
fn ensure_image(source: &SourceFile) -> Result<()> {
    if source.bytes.is_empty() {
        return Err(BackendError::Input(format!("{} is empty", source.name)));
    }
    if !source.is_image() {
        return Err(BackendError::Input(format!(
            "{} is not an image ({})",
            source.name, source.mime_type
        )));
    }
    Ok(())
}

/// Name an encoded output: the input name with `format`'s extension.
pub fn output_file_name(name: &str, format: OutputFormat) -> String {
    replace_extension(name, format.extension())
}

/// Replace the filename's extension, or append one when it has none.
fn replace_extension(name: &str, extension: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains(['/', '\\']) => stem,
        _ => name,
    };
    format!("{stem}.{extension}")
}

fn dimensions_of(image: &image::DynamicImage) -> Dimensions {
    Dimensions {
        width: image.width(),
        height: image.height(),
    }
}

/// Outcome of a compression, including how the size search ended.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub file: EncodedFile,
    pub width: u32,
    pub height: u32,
    /// Quality of the returned encode.
    pub quality: Quality,
    /// Number of encodes performed, including a failed final one.
    pub attempts: u32,
    /// Budget the search aimed for.
    pub max_size_mb: f64,
}

impl CompressedImage {
    /// Whether the returned bytes fit the budget. The search gives up at the
    /// quality floor, so this can be false on a successful compression.
    pub fn within_budget(&self) -> bool {
        !exceeds_budget(self.file.bytes.len(), self.max_size_mb)
    }
}

/// Plan the draw for a bounded compression without executing it.
pub fn plan_compression(source: Dimensions, options: &CompressionOptions) -> RenderPlan {
    let (width, height) = calculate_fit_dimensions(
        (source.width, source.height),
        (options.max_width, options.max_height),
        options.maintain_aspect_ratio,
    );
    RenderPlan::Scale { width, height }
}

/// Compress an image to fit `options`' dimension bounds and size budget.
///
/// The fitted canvas is encoded at `options.quality`; while the result is
/// over budget and the quality is above the 50% floor, it is re-encoded
/// 10 points lower. A failed re-encode ends the search with the last good
/// result instead of failing the call, and an over-budget result at the
/// floor is returned as is.
pub fn compress_image(
    backend: &impl ImageBackend,
    source: &SourceFile,
    options: &CompressionOptions,
) -> Result<CompressedImage> {
    compress(backend, source, options).map_err(|e| e.context("compress"))
}

fn compress(
    backend: &impl ImageBackend,
    source: &SourceFile,
    options: &CompressionOptions,
) -> Result<CompressedImage> {
    ensure_image(source)?;

    let canvas = {
        let decoded = backend.decode(source)?;
        let plan = plan_compression(dimensions_of(&decoded), options);
        backend.render(&decoded, &plan)?
    };

    let mut quality = options.quality;
    let mut bytes = backend.encode(&canvas, options.format, quality)?;
    let mut attempts = 1;

    while exceeds_budget(bytes.len(), options.max_size_mb) && quality.can_reduce() {
        let next = quality.reduced();
        debug!(
            "{}: {} bytes at quality {quality} over {} MB, retrying at {next}",
            source.name,
            bytes.len(),
            options.max_size_mb
        );
        attempts += 1;
        match backend.encode(&canvas, options.format, next) {
            Ok(smaller) => {
                bytes = smaller;
                quality = next;
            }
            Err(e) => {
                warn!(
                    "{}: re-encode at quality {next} failed, keeping quality {quality}: {e}",
                    source.name
                );
                break;
            }
        }
    }

    let result = CompressedImage {
        file: EncodedFile {
            name: output_file_name(&source.name, options.format),
            mime_type: options.format.mime_type().to_string(),
            bytes,
        },
        width: canvas.width(),
        height: canvas.height(),
        quality,
        attempts,
        max_size_mb: options.max_size_mb,
    };

    if result.within_budget() {
        info!(
            "{} → {} ({}x{}, {} bytes, quality {quality})",
            source.name,
            result.file.name,
            result.width,
            result.height,
            result.file.size()
        );
    } else {
        warn!(
            "{}: {} bytes still over {} MB at quality {quality}",
            source.name,
            result.file.size(),
            options.max_size_mb
        );
    }
    Ok(result)
}

/// Compress every source concurrently on the rayon pool.
///
/// Results keep input order. The batch fails as soon as any item fails:
/// rayon stops handing out remaining items, the failure that stopped it is
/// returned and no partial results are kept.
pub fn compress_images(
    backend: &impl ImageBackend,
    sources: &[SourceFile],
    options: &CompressionOptions,
) -> Result<Vec<CompressedImage>> {
    sources
        .par_iter()
        .map(|source| compress_image(backend, source, options))
        .collect()
}

/// Plan an exact-size resize without executing it.
pub fn plan_resize(
    source: Dimensions,
    target_width: u32,
    target_height: u32,
    options: &ResizeOptions,
) -> RenderPlan {
    calculate_resize_plan(
        (source.width, source.height),
        (target_width, target_height),
        options.fit,
    )
}

/// Resize to exactly `target_width × target_height`, encoded as JPEG.
///
/// [`FitMode::Cover`](super::params::FitMode::Cover) crops the source
/// symmetrically to fill the canvas; `Contain` scales the whole source in
/// and letterboxes the rest in black.
pub fn resize_image(
    backend: &impl ImageBackend,
    source: &SourceFile,
    target_width: u32,
    target_height: u32,
    options: &ResizeOptions,
) -> Result<EncodedFile> {
    resize(backend, source, target_width, target_height, options)
        .map_err(|e| e.context("resize"))
}

fn resize(
    backend: &impl ImageBackend,
    source: &SourceFile,
    target_width: u32,
    target_height: u32,
    options: &ResizeOptions,
) -> Result<EncodedFile> {
    ensure_image(source)?;
    if target_width == 0 || target_height == 0 {
        return Err(BackendError::Input(format!(
            "target size {target_width}x{target_height} must be positive"
        )));
    }

    let canvas = {
        let decoded = backend.decode(source)?;
        let plan = plan_resize(
            dimensions_of(&decoded),
            target_width,
            target_height,
            options,
        );
        backend.render(&decoded, &plan)?
    };
    let bytes = backend.encode(&canvas, OutputFormat::Jpeg, options.quality)?;

    debug!(
        "{}: resized to {target_width}x{target_height} ({:?}), {} bytes",
        source.name,
        options.fit,
        bytes.len()
    );

    Ok(EncodedFile {
        name: output_file_name(&source.name, OutputFormat::Jpeg),
        mime_type: OutputFormat::Jpeg.mime_type().to_string(),
        bytes,
    })
}

/// Check a file against upload policy.
///
/// Checks run in order and stop at the first failure: presence, image MIME
/// type, allow-list, byte size, then dimensions. Dimensions come from the
/// header (orientation applied), so an oversized canvas is reported as such
/// rather than failing to decode. Violations are reported in the result,
/// never as errors; an unreadable header becomes a "Failed to read image
/// dimensions" violation.
pub fn validate_image(
    backend: &impl ImageBackend,
    file: Option<&SourceFile>,
    options: &ValidationOptions,
) -> ValidationResult {
    let Some(file) = file else {
        return ValidationResult::invalid("No file provided");
    };

    if !file.is_image() {
        return ValidationResult::invalid("File must be an image");
    }

    if !options.allowed_types.iter().any(|t| t == &file.mime_type) {
        return ValidationResult::invalid(format!(
            "File type {} is not allowed. Allowed types: {}",
            file.mime_type,
            options.allowed_types.join(", ")
        ));
    }

    if file.size() > options.max_size {
        return ValidationResult::invalid(format!(
            "File size must be less than {}MB",
            format_megabytes(options.max_size)
        ));
    }

    match backend.identify(file) {
        Ok(dims) => {
            if dims.width > options.max_width || dims.height > options.max_height {
                ValidationResult::invalid(format!(
                    "Image dimensions must be at most {}x{} pixels (got {}x{})",
                    options.max_width, options.max_height, dims.width, dims.height
                ))
            } else {
                ValidationResult::ok()
            }
        }
        Err(e) => {
            debug!("validate: {}: {e}", file.name);
            ValidationResult::invalid("Failed to read image dimensions")
        }
    }
}

/// Read an image's displayed dimensions from its header and report them
/// alongside the upload metadata.
pub fn get_image_info(backend: &impl ImageBackend, source: &SourceFile) -> Result<ImageInfo> {
    ensure_image(source).map_err(|e| e.context("info"))?;
    let dims = backend.identify(source).map_err(|e| e.context("info"))?;

    Ok(ImageInfo {
        width: dims.width,
        height: dims.height,
        size: source.size(),
        mime_type: source.mime_type.clone(),
        name: source.name.clone(),
    })
}

/// Validate then compress an upload, as the storage layer does before
/// handing bytes to object storage.
///
/// A policy violation fails with [`BackendError::Rejected`] carrying the
/// validation reason.
pub fn prepare_upload(
    backend: &impl ImageBackend,
    source: &SourceFile,
    compression: &CompressionOptions,
    validation: &ValidationOptions,
) -> Result<CompressedImage> {
    let verdict = validate_image(backend, Some(source), validation);
    if let Some(reason) = verdict.error {
        return Err(BackendError::Rejected(format!("{}: {reason}", source.name)).context("prepare"));
    }
    compress_image(backend, source, compression)
}

/// [`prepare_upload`] every source concurrently. Fails like
/// [`compress_images`]: on the first rejected or failed item, without
/// partial results.
pub fn prepare_uploads(
    backend: &impl ImageBackend,
    sources: &[SourceFile],
    compression: &CompressionOptions,
    validation: &ValidationOptions,
) -> Result<Vec<CompressedImage>> {
    sources
        .par_iter()
        .map(|source| prepare_upload(backend, source, compression, validation))
        .collect()
}
