//! chromatrace-cli: trace an image file into per-color SVG layers.
//!
//! Runs the same session the web app drives: extract the palette, build
//! one mask per color, trace every mask and merge the traces. Results
//! are written to an output directory:
//!
//! - `generated_image.svg`: the merged document
//! - `svg-<index>-<hex>.svg`: one document per trace
//! - `mask-<index>-<hex>.png`: the masks, with `--masks`
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin chromatrace-cli -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod logger;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use chromatrace_pipeline::PipelineConfig;
use chromatrace_session::{Mode, OutlineTracer, Session};

use crate::output::{CliError, Report};

/// Trace an image into one SVG layer per dominant color.
#[derive(Parser, Debug)]
#[command(name = "chromatrace-cli", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP, GIF).
    image_path: PathBuf,

    /// Trace the whole image in black, or one layer per palette color.
    #[arg(long, value_enum, default_value_t = CliMode::Color)]
    mode: CliMode,

    /// Directory receiving the generated files.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Number of palette colors to extract.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_PALETTE_SIZE)]
    palette_size: usize,

    /// CIEDE2000 distance below which a pixel belongs to a color.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MATCH_THRESHOLD)]
    match_threshold: f32,

    /// Luma cutoff of the tracer: darker pixels are traced.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_TRACE_THRESHOLD)]
    trace_threshold: u8,

    /// RDP simplification tolerance in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SIMPLIFY_TOLERANCE)]
    simplify_tolerance: f64,

    /// Also write every mask as a PNG.
    #[arg(long)]
    masks: bool,

    /// Print a JSON report on stdout instead of a human-readable summary.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, the individual parameter flags are ignored.
    #[arg(long)]
    config_json: Option<String>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// Generation mode selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CliMode {
    /// Single black trace of the whole image.
    Mono,
    /// One colored trace per palette color.
    Color,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Mono => Self::Monochrome,
            CliMode::Color => Self::Color,
        }
    }
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// `--config-json` wins over the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, CliError> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| CliError::Config(e.to_string()))?
    } else {
        PipelineConfig {
            palette_size: cli.palette_size,
            match_threshold: cli.match_threshold,
            trace_threshold: cli.trace_threshold,
            simplify_tolerance: cli.simplify_tolerance,
            ..PipelineConfig::default()
        }
    };
    config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<Report, CliError> {
    let config = config_from_cli(cli)?;
    let bytes = std::fs::read(&cli.image_path).map_err(|source| CliError::Io {
        path: cli.image_path.clone(),
        source,
    })?;
    let name = cli.image_path.display().to_string();

    let tracer = OutlineTracer::from_config(&config);
    let mut session = Session::new(config)?;
    session.load(&bytes, &name)?;
    if !cli.json {
        eprintln!("Image: {name} ({} bytes)", bytes.len());
        eprintln!("Palette: {}", output::palette_line(session.palette()));
    }

    let outcome = session.generate(cli.mode.into(), &tracer);

    // Partial results of a failed run are still written.
    let mut report = output::write_results(&session, cli.mode.into(), &cli.out_dir, cli.masks)?;
    if let Err(e) = outcome {
        report.error = Some(e.to_string());
    }
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let report = match run(&cli) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", report.summary());
    }

    if report.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
