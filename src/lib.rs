//! # Moments Media
//!
//! Image handling for uploads to a moments-sharing app: validate a picked
//! file against upload policy, shrink photos to a bounded box and byte
//! budget, cut exact-size thumbnails and avatars, and read basic metadata.
//! Files stay in memory from input bytes to encoded output; storage and
//! upload are someone else's job.
//!
//! # Architecture: Decode → Render → Encode
//!
//! Every transform runs three strictly ordered stages on an
//! [`ImageBackend`](imaging::ImageBackend):
//!
//! ```text
//! 1. Decode   SourceFile bytes  →  raster         (format sniffed, EXIF orientation applied)
//! 2. Render   raster + plan     →  fresh canvas   (Lanczos3, crop or letterbox)
//! 3. Encode   canvas + quality  →  EncodedFile    (JPEG / PNG / WebP)
//! ```
//!
//! Validation and info stop short of stage 1: they read dimensions from the
//! header alone.
//!
//! Geometry is resolved up front by pure functions into a
//! [`RenderPlan`](imaging::RenderPlan), so the arithmetic is unit-tested
//! without pixels and the operations can be exercised against a recording
//! mock backend.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry, backend trait, `image`-crate backend, high-level operations |
//! | [`types`] | Input/output contracts: `SourceFile`, `EncodedFile`, `ImageInfo`, `ValidationResult` |
//! | [`config`] | `media.toml` loading, merging over stock defaults, validation |
//! | [`inputs`] | CLI input discovery and collision-free output placement |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Best-Effort Size Budget
//!
//! Compression steps the encoder quality down by 0.1 while the result is
//! over budget, and stops once quality is at or below 0.5. Whatever comes
//! out of the last step is returned even if it is still too large; the
//! returned [`CompressedImage`](imaging::CompressedImage) says so through
//! `within_budget()`. Failing the upload instead would leave the user with
//! nothing to post.
//!
//! ## Validation Is Data, Not Errors
//!
//! [`validate_image`](imaging::validate_image) returns a verdict with a
//! user-facing reason instead of an error. Checks run in a fixed order and
//! the first failure wins, so the message always names the most basic
//! problem.

pub mod config;
pub mod imaging;
pub mod inputs;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
