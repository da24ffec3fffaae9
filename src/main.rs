use clap::{Parser, Subcommand};
use log::{debug, warn};
use moments_media::config;
use moments_media::imaging::{self, FitMode, OutputFormat, Preset, RustBackend};
use moments_media::inputs::{InputFile, collect_inputs, plan_outputs};
use moments_media::output;
use moments_media::types::SourceFile;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "moments-media")]
#[command(about = "Validate, compress and resize images for upload")]
#[command(long_about = "\
Validate, compress and resize images for upload

Inputs may be files or directories; directories are walked recursively for
supported image extensions. Encoded outputs are written below --output at
the input's path relative to the directory it was found in, with the
extension of the output format. Inputs that would write the same output
file are rejected before anything is encoded.

Compression fits the image inside a bounding box, then lowers the encoder
quality in 0.1 steps while the file is over the size budget, stopping at
0.5. A file that still does not fit is written anyway with a warning.

Settings come from media.toml (all keys optional). Command-line flags
override the file. Set RUST_LOG=debug to watch the quality search.

Run 'moments-media gen-config' to generate a documented media.toml.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults apply when it does not exist)
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Directory encoded files are written to
    #[arg(long, short, default_value = "out", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Image files or directories to process.
#[derive(clap::Args, Clone)]
struct InputArgs {
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fit images in a bounding box and compress them under a size budget
    Compress {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        max_height: Option<u32>,
        /// Starting quality, in (0, 1]
        #[arg(long)]
        quality: Option<f64>,
        /// Size budget in megabytes
        #[arg(long)]
        max_size_mb: Option<f64>,
        /// Output type: jpeg, png, webp or a MIME type
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Clamp each axis independently instead of scaling uniformly
        #[arg(long)]
        stretch: bool,
    },
    /// Resize images to exact dimensions (JPEG output)
    Resize {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// cover (crop to fill) or contain (letterbox in black)
        #[arg(long)]
        fit: Option<FitMode>,
        #[arg(long)]
        quality: Option<f64>,
    },
    /// Check images against the upload policy
    Validate {
        #[command(flatten)]
        inputs: InputArgs,
        /// Print one JSON verdict per line
        #[arg(long)]
        json: bool,
    },
    /// Print dimensions, size and type of images
    Info {
        #[command(flatten)]
        inputs: InputArgs,
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Validate then compress images with an upload preset
    Prepare {
        #[command(flatten)]
        inputs: InputArgs,
        /// moment or profile
        #[arg(long, default_value = "moment")]
        preset: Preset,
    },
    /// Print a stock media.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut media_config = config::load_config_file(&cli.config)?;
    debug!("loaded config from {}", cli.config.display());
    let backend = RustBackend::new();

    match cli.command {
        Command::Compress {
            inputs,
            max_width,
            max_height,
            quality,
            max_size_mb,
            format,
            stretch,
        } => {
            let c = &mut media_config.compression;
            if let Some(v) = max_width {
                c.max_width = v;
            }
            if let Some(v) = max_height {
                c.max_height = v;
            }
            if let Some(v) = quality {
                c.quality = v;
            }
            if let Some(v) = max_size_mb {
                c.max_size_mb = v;
            }
            if let Some(v) = format {
                c.mime_type = v;
            }
            if stretch {
                c.maintain_aspect_ratio = false;
            }
            media_config.validate()?;
            init_thread_pool(&media_config.processing);

            let options = media_config.compression.to_options();
            let files = collect_inputs(&inputs.inputs)?;
            plan_outputs(&files, &cli.output, options.format)?;
            let sources = read_sources(&files)?;
            let results = imaging::compress_images(&backend, &sources, &options)?;
            let report = save_all(&files, sources, results, &cli.output)?;
            output::print_compress_output(&report);
        }
        Command::Resize {
            inputs,
            width,
            height,
            fit,
            quality,
        } => {
            if let Some(v) = fit {
                media_config.resize.fit = v;
            }
            if let Some(v) = quality {
                media_config.resize.quality = v;
            }
            media_config.validate()?;
            let options = media_config.resize.to_options();

            let files = collect_inputs(&inputs.inputs)?;
            plan_outputs(&files, &cli.output, OutputFormat::Jpeg)?;
            let sources = read_sources(&files)?;
            for (i, (file, source)) in files.iter().zip(&sources).enumerate() {
                let resized = imaging::resize_image(&backend, source, width, height, &options)?;
                let path = resized.save(&file.output_dir(&cli.output))?;
                for line in output::format_resized(i + 1, &source.name, &resized, width, height) {
                    println!("{}", line);
                }
                println!("{}", output::format_saved(&path));
            }
        }
        Command::Validate { inputs, json } => {
            let options = media_config.validation.to_options();
            let mut failures = 0;
            let files = collect_inputs(&inputs.inputs)?;
            for (i, source) in read_sources(&files)?.iter().enumerate() {
                let verdict = imaging::validate_image(&backend, Some(source), &options);
                if !verdict.valid {
                    failures += 1;
                }
                if json {
                    println!(
                        "{}",
                        serde_json::json!({ "name": source.name, "result": verdict })
                    );
                } else {
                    println!("{}", output::format_validation(i + 1, &source.name, &verdict));
                }
            }
            if failures > 0 {
                warn!("{failures} file(s) failed validation");
                std::process::exit(1);
            }
        }
        Command::Info { inputs, json } => {
            let files = collect_inputs(&inputs.inputs)?;
            for (i, source) in read_sources(&files)?.iter().enumerate() {
                let info = imaging::get_image_info(&backend, source)?;
                if json {
                    println!("{}", serde_json::to_string(&info)?);
                } else {
                    println!("{}", output::format_info(i + 1, &info));
                }
            }
        }
        Command::Prepare { inputs, preset } => {
            init_thread_pool(&media_config.processing);
            let compression = media_config.preset(preset);
            let validation = media_config.validation.to_options();
            let files = collect_inputs(&inputs.inputs)?;
            plan_outputs(&files, &cli.output, compression.format)?;
            let sources = read_sources(&files)?;
            let results =
                imaging::prepare_uploads(&backend, &sources, &compression, &validation)?;
            let report = save_all(&files, sources, results, &cli.output)?;
            output::print_compress_output(&report);
        }
        Command::GenConfig => unreachable!("handled before config is loaded"),
    }

    Ok(())
}

/// Write each result next to where its input sits relative to its root,
/// pairing it with the input name for the report.
fn save_all(
    files: &[InputFile],
    sources: Vec<SourceFile>,
    results: Vec<imaging::CompressedImage>,
    output_root: &Path,
) -> Result<Vec<(String, imaging::CompressedImage)>, Box<dyn std::error::Error>> {
    let mut report = Vec::with_capacity(results.len());
    for ((file, source), result) in files.iter().zip(sources).zip(results) {
        let path = result.file.save(&file.output_dir(output_root))?;
        debug!("wrote {}", path.display());
        report.push((source.name, result));
    }
    Ok(report)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn read_sources(files: &[InputFile]) -> Result<Vec<SourceFile>, Box<dyn std::error::Error>> {
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let source = SourceFile::from_path(&file.path)
            .map_err(|e| format!("{}: {e}", file.path.display()))?;
        sources.push(source);
    }
    Ok(sources)
}
