//! Media configuration module.
//!
//! Handles loading, validating, and merging `media.toml`. Stock defaults are
//! serialized to a TOML value and the user's file is merged over them key by
//! key, so a config file only needs the values it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [compression]
//! max_width = 1920
//! max_height = 1920
//! quality = 0.85              # Starting quality for the size search
//! max_size_mb = 1.5           # Best-effort budget (1 MB = 1048576 bytes)
//! mime_type = "image/jpeg"    # image/jpeg, image/png or image/webp
//! maintain_aspect_ratio = true
//!
//! [resize]
//! fit = "cover"               # cover or contain
//! quality = 0.92
//!
//! [validation]
//! max_size_mb = 10
//! allowed_types = ["image/jpeg", "image/png", "image/webp"]
//! max_width = 8192
//! max_height = 8192
//!
//! [presets.moment]            # Same keys as [compression]
//! [presets.profile]
//!
//! [processing]
//! max_processes = 4           # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    BYTES_PER_MB, CompressionOptions, FitMode, OutputFormat, Preset, Quality, ResizeOptions,
    ValidationOptions,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in a directory.
pub const CONFIG_FILE_NAME: &str = "media.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Media configuration loaded from `media.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Defaults for the `compress` command.
    pub compression: CompressionConfig,
    /// Defaults for the `resize` command.
    pub resize: ResizeConfig,
    /// Upload policy checked by `validate` and `prepare`.
    pub validation: ValidationConfig,
    /// Named upload profiles used by `prepare`.
    pub presets: PresetsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl MediaConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compression.validate("compression")?;
        self.presets.moment.validate("presets.moment")?;
        self.presets.profile.validate("presets.profile")?;
        check_quality("resize.quality", self.resize.quality)?;

        let v = &self.validation;
        if !(v.max_size_mb > 0.0) {
            return Err(ConfigError::Validation(
                "validation.max_size_mb must be positive".into(),
            ));
        }
        if v.max_width == 0 || v.max_height == 0 {
            return Err(ConfigError::Validation(
                "validation.max_width and max_height must be non-zero".into(),
            ));
        }
        if v.allowed_types.is_empty() {
            return Err(ConfigError::Validation(
                "validation.allowed_types must not be empty".into(),
            ));
        }
        if let Some(bad) = v.allowed_types.iter().find(|t| !t.starts_with("image/")) {
            return Err(ConfigError::Validation(format!(
                "validation.allowed_types entry {bad:?} is not an image MIME type"
            )));
        }
        Ok(())
    }

    /// Compression options for a named preset.
    pub fn preset(&self, preset: Preset) -> CompressionOptions {
        match preset {
            Preset::Moment => self.presets.moment.to_options(),
            Preset::Profile => self.presets.profile.to_options(),
        }
    }
}

fn check_quality(key: &str, quality: f64) -> Result<(), ConfigError> {
    if quality > 0.0 && quality <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{key} must be in (0, 1], got {quality}"
        )))
    }
}

/// Compression settings, shared by `[compression]` and each preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// Starting quality as a fraction, e.g. `0.85`.
    pub quality: f64,
    pub max_size_mb: f64,
    pub mime_type: OutputFormat,
    pub maintain_aspect_ratio: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::from_options(&CompressionOptions::default())
    }
}

impl CompressionConfig {
    fn from_options(options: &CompressionOptions) -> Self {
        Self {
            max_width: options.max_width,
            max_height: options.max_height,
            quality: options.quality.as_fraction(),
            max_size_mb: options.max_size_mb,
            mime_type: options.format,
            maintain_aspect_ratio: options.maintain_aspect_ratio,
        }
    }

    pub fn to_options(&self) -> CompressionOptions {
        CompressionOptions {
            max_width: self.max_width,
            max_height: self.max_height,
            quality: Quality::from_fraction(self.quality),
            max_size_mb: self.max_size_mb,
            format: self.mime_type,
            maintain_aspect_ratio: self.maintain_aspect_ratio,
        }
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        check_quality(&format!("{section}.quality"), self.quality)?;
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ConfigError::Validation(format!(
                "{section}.max_width and max_height must be non-zero"
            )));
        }
        if !(self.max_size_mb > 0.0) {
            return Err(ConfigError::Validation(format!(
                "{section}.max_size_mb must be positive"
            )));
        }
        Ok(())
    }
}

/// Exact-size resize settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub fit: FitMode,
    pub quality: f64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        let options = ResizeOptions::default();
        Self {
            fit: options.fit,
            quality: options.quality.as_fraction(),
        }
    }
}

impl ResizeConfig {
    pub fn to_options(&self) -> ResizeOptions {
        ResizeOptions {
            fit: self.fit,
            quality: Quality::from_fraction(self.quality),
        }
    }
}

/// Upload policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub max_size_mb: f64,
    pub allowed_types: Vec<String>,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let options = ValidationOptions::default();
        Self {
            max_size_mb: options.max_size as f64 / BYTES_PER_MB,
            allowed_types: options.allowed_types,
            max_width: options.max_width,
            max_height: options.max_height,
        }
    }
}

impl ValidationConfig {
    pub fn to_options(&self) -> ValidationOptions {
        ValidationOptions {
            max_size: (self.max_size_mb * BYTES_PER_MB).round() as u64,
            allowed_types: self.allowed_types.clone(),
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

/// The two upload profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresetsConfig {
    pub moment: CompressionConfig,
    pub profile: CompressionConfig,
}

impl Default for PresetsConfig {
    fn default() -> Self {
        Self {
            moment: CompressionConfig::from_options(&Preset::Moment.compression_options()),
            profile: CompressionConfig::from_options(&Preset::Profile.compression_options()),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel compression workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Stock defaults as a TOML value, the base every user file merges onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(MediaConfig::default()).expect("default config must serialize")
}

/// Deep-merge two TOML values. Tables merge key by key; anything else in
/// `overlay` replaces `base`.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MediaConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MediaConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a specific file, falling back to stock defaults when it
/// does not exist.
pub fn load_config_file(config_path: &Path) -> Result<MediaConfig, ConfigError> {
    let overlay = load_raw_config(config_path)?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Load config from `media.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<MediaConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Returns a fully-commented stock `media.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Moments Media Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Compression (compress command)
# ---------------------------------------------------------------------------
[compression]
# Output is scaled down to fit inside this box; it is never scaled up.
max_width = 1920
max_height = 1920

# Starting encoder quality. While the output is over budget the quality
# drops by 0.1 per attempt, stopping once it is at or below 0.5.
quality = 0.85

# Size budget in megabytes (1 MB = 1048576 bytes). Best effort: a file that
# still does not fit at the lowest quality is returned anyway, with a warning.
max_size_mb = 1.5

# Output type: "image/jpeg", "image/png" or "image/webp".
mime_type = "image/jpeg"

# Scale both axes by the same factor. When false each axis is clamped to
# its bound independently.
maintain_aspect_ratio = true

# ---------------------------------------------------------------------------
# Exact-size resize (resize command)
# ---------------------------------------------------------------------------
[resize]
# "cover" crops the source to fill the target.
# "contain" fits the whole source and pads with black bars.
fit = "cover"
quality = 0.92

# ---------------------------------------------------------------------------
# Upload policy (validate and prepare commands)
# ---------------------------------------------------------------------------
[validation]
max_size_mb = 10.0
allowed_types = ["image/jpeg", "image/png", "image/webp"]
max_width = 8192
max_height = 8192

# ---------------------------------------------------------------------------
# Upload presets (prepare command). Same keys as [compression].
# ---------------------------------------------------------------------------
[presets.moment]
max_width = 1920
max_height = 1920
quality = 0.85
max_size_mb = 1.5
mime_type = "image/jpeg"
maintain_aspect_ratio = true

[presets.profile]
max_width = 512
max_height = 512
quality = 0.8
max_size_mb = 0.1
mime_type = "image/jpeg"
maintain_aspect_ratio = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel compression workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
