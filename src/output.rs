//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! Each processed file gets a header line (positional index, input name and
//! output name) followed by indented detail lines.
//!
//! ## Compress / Prepare
//!
//! ```text
//! 001 beach.png → beach.jpg
//!     1920x1440, 812.5 KB at quality 0.75 (3 attempts)
//! 002 noise.png → noise.jpg
//!     1920x1920, 1.9 MB at quality 0.45 (5 attempts)
//!     Over budget: 1.5 MB
//!
//! Compressed 2 images, 1 over budget
//! ```
//!
//! ## Validate / Info
//!
//! ```text
//! 001 beach.jpg: valid
//! 002 anim.gif: File type image/gif is not allowed. Allowed types: …
//! 001 beach.jpg: 4000x3000, 2.4 MB, image/jpeg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::imaging::CompressedImage;
use crate::types::{EncodedFile, ImageInfo, ValidationResult};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count using 1024-based units.
///
/// ```text
/// 512 B
/// 812.5 KB
/// 1.9 MB
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Format one compression result.
pub fn format_compressed(index: usize, source_name: &str, result: &CompressedImage) -> Vec<String> {
    let attempts = if result.attempts == 1 {
        "1 attempt".to_string()
    } else {
        format!("{} attempts", result.attempts)
    };
    let mut lines = vec![
        format!(
            "{} {} → {}",
            format_index(index),
            source_name,
            result.file.name
        ),
        format!(
            "{}{}x{}, {} at quality {} ({})",
            indent(1),
            result.width,
            result.height,
            format_bytes(result.file.size()),
            result.quality,
            attempts
        ),
    ];
    if !result.within_budget() {
        lines.push(format!(
            "{}Over budget: {} MB",
            indent(1),
            result.max_size_mb
        ));
    }
    lines
}

/// Format a batch of compression results with a closing summary line.
pub fn format_compress_output(results: &[(String, CompressedImage)]) -> Vec<String> {
    let mut lines: Vec<String> = results
        .iter()
        .enumerate()
        .flat_map(|(i, (name, result))| format_compressed(i + 1, name, result))
        .collect();

    let over = results.iter().filter(|(_, r)| !r.within_budget()).count();
    let noun = if results.len() == 1 { "image" } else { "images" };
    lines.push(String::new());
    if over == 0 {
        lines.push(format!("Compressed {} {noun}", results.len()));
    } else {
        lines.push(format!(
            "Compressed {} {noun}, {over} over budget",
            results.len()
        ));
    }
    lines
}

pub fn print_compress_output(results: &[(String, CompressedImage)]) {
    for line in format_compress_output(results) {
        println!("{}", line);
    }
}

/// Format one exact-size resize result.
pub fn format_resized(
    index: usize,
    source_name: &str,
    output: &EncodedFile,
    width: u32,
    height: u32,
) -> Vec<String> {
    vec![
        format!("{} {} → {}", format_index(index), source_name, output.name),
        format!(
            "{}{}x{}, {}",
            indent(1),
            width,
            height,
            format_bytes(output.size())
        ),
    ]
}

/// Format one validation verdict.
pub fn format_validation(index: usize, name: &str, result: &ValidationResult) -> String {
    match &result.error {
        None => format!("{} {}: valid", format_index(index), name),
        Some(reason) => format!("{} {}: {}", format_index(index), name, reason),
    }
}

/// Format decoded image metadata.
pub fn format_info(index: usize, info: &ImageInfo) -> String {
    format!(
        "{} {}: {}x{}, {}, {}",
        format_index(index),
        info.name,
        info.width,
        info.height,
        format_bytes(info.size),
        info.mime_type
    )
}

/// Line announcing where an output was written.
pub fn format_saved(path: &std::path::Path) -> String {
    format!("{}Saved: {}", indent(1), path.display())
}
