//! Input discovery and output placement for the CLI.
//!
//! File arguments are taken as given. Directory arguments are walked
//! recursively for supported image extensions, and each file keeps its path
//! relative to the directory it was found under. Outputs land at that same
//! relative path below the output directory, so `photos/a/beach.png` and
//! `photos/b/beach.png` stay apart as `out/a/beach.jpg` and `out/b/beach.jpg`.
//!
//! Inputs that would still write the same output file (`beach.png` next to
//! `beach.jpg`, or two file arguments with the same name) are rejected by
//! [`plan_outputs`] before anything is encoded.

use crate::imaging::{OutputFormat, output_file_name, supported_input_extensions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(
        "{} and {} would both be written to {}",
        first.display(),
        second.display(),
        output.display()
    )]
    Collision {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },
}

/// An image found on disk, with where its output belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Path relative to the directory argument it was found under; just the
    /// file name for file arguments.
    pub relative: PathBuf,
}

impl InputFile {
    fn file_argument(path: &Path) -> Self {
        let relative = path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf());
        Self {
            path: path.to_path_buf(),
            relative,
        }
    }

    /// Directory this input's output is saved into.
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        match self.relative.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => output_root.join(parent),
            _ => output_root.to_path_buf(),
        }
    }

    /// Full path of the encoded output.
    pub fn output_path(&self, output_root: &Path, format: OutputFormat) -> PathBuf {
        let name = self
            .relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.output_dir(output_root)
            .join(output_file_name(&name, format))
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            supported_input_extensions().contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Expand file and directory arguments into image inputs.
///
/// Files are taken as given; directories contribute only files with a
/// supported image extension, in path order.
pub fn collect_inputs(arguments: &[PathBuf]) -> Result<Vec<InputFile>, InputError> {
    let mut inputs = Vec::new();
    for argument in arguments {
        if !argument.is_dir() {
            inputs.push(InputFile::file_argument(argument));
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(argument).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() || !has_supported_extension(entry.path()) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(argument)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(entry.file_name()));
            found.push(InputFile {
                path: entry.into_path(),
                relative,
            });
        }
        found.sort_by(|a, b| a.path.cmp(&b.path));
        inputs.extend(found);
    }
    Ok(inputs)
}

/// Resolve every input's output path, failing if two inputs share one.
pub fn plan_outputs(
    inputs: &[InputFile],
    output_root: &Path,
    format: OutputFormat,
) -> Result<Vec<PathBuf>, InputError> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    let mut outputs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let output = input.output_path(output_root, format);
        if let Some(first) = claimed.insert(output.clone(), &input.path) {
            return Err(InputError::Collision {
                first: first.to_path_buf(),
                second: input.path.clone(),
                output,
            });
        }
        outputs.push(output);
    }
    Ok(outputs)
}
