//! Writing generation results to disk and reporting them.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chromatrace_export::MergeError;
use chromatrace_pipeline::decode::encode_png;
use chromatrace_pipeline::{PipelineError, Rgb};
use chromatrace_session::{Mode, Session, SessionError};
use serde::Serialize;

/// Filename of the merged document.
pub const MERGED_FILENAME: &str = "generated_image.svg";

/// Everything that can stop the CLI.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration flags or `--config-json` are unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading the input or writing an output failed.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Loading the image failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A mask could not be encoded.
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] PipelineError),

    /// The traces could not be merged.
    #[error("merging traces failed: {0}")]
    Merge(#[from] MergeError),
}

/// Machine-readable summary of one CLI run.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Input name as given on the command line.
    pub image: Option<String>,
    /// Source width in pixels.
    pub width: u32,
    /// Source height in pixels.
    pub height: u32,
    /// The generation mode that ran.
    pub mode: Mode,
    /// Extracted palette, most significant first.
    pub palette: Vec<Rgb>,
    /// Mask PNGs written, in palette order.
    pub masks: Vec<PathBuf>,
    /// Per-trace SVGs written, in job order.
    pub traces: Vec<PathBuf>,
    /// The merged document, when any trace was produced.
    pub merged: Option<PathBuf>,
    /// Why the run stopped early, if it did.
    pub error: Option<String>,
}

impl Report {
    /// Human-readable multi-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {}x{}: {} color(s), {} trace(s), {} mask(s) written",
            self.image.as_deref().unwrap_or("<image>"),
            self.width,
            self.height,
            self.palette.len(),
            self.traces.len(),
            self.masks.len(),
        );
        if let Some(ref merged) = self.merged {
            let _ = writeln!(out, "Merged: {}", merged.display());
        }
        if let Some(ref error) = self.error {
            let _ = writeln!(out, "Stopped early: {error}");
        }
        out.trim_end().to_owned()
    }
}

/// Palette as a space separated list of hex codes.
pub fn palette_line(palette: &[Rgb]) -> String {
    palette
        .iter()
        .copied()
        .map(Rgb::to_hex)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `<index>-<hex>` with a lowercase, `#`-less hex, or `<index>-mono`.
fn layer_stem(index: usize, color: Option<Rgb>) -> String {
    color.map_or_else(
        || format!("{index}-mono"),
        |c| format!("{index}-{}", c.to_hex().trim_start_matches('#').to_lowercase()),
    )
}

fn write_file(path: PathBuf, contents: &[u8]) -> Result<PathBuf, CliError> {
    std::fs::write(&path, contents).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(path)
}

/// Write the session's traces, merged document and optionally its masks
/// into `out_dir`.
///
/// # Errors
///
/// Returns [`CliError::Io`] if a file cannot be written,
/// [`CliError::Encode`] if a mask fails to encode and
/// [`CliError::Merge`] if the traces do not merge.
pub fn write_results(
    session: &Session,
    mode: Mode,
    out_dir: &Path,
    write_masks: bool,
) -> Result<Report, CliError> {
    std::fs::create_dir_all(out_dir).map_err(|source| CliError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut masks = Vec::new();
    if write_masks {
        for (i, mask) in session.masks().iter().enumerate() {
            let name = format!("mask-{}.png", layer_stem(i, Some(mask.color)));
            masks.push(write_file(out_dir.join(name), &encode_png(&mask.image)?)?);
        }
    }

    let mut traces = Vec::new();
    for (i, trace) in session.traces().iter().enumerate() {
        let name = format!("svg-{}.svg", layer_stem(i, trace.color));
        traces.push(write_file(out_dir.join(name), trace.svg.as_bytes())?);
    }

    let merged = if traces.is_empty() {
        None
    } else {
        let svg = session.merged_svg()?;
        Some(write_file(out_dir.join(MERGED_FILENAME), svg.as_bytes())?)
    };

    let (width, height) = session.image().map_or((0, 0), |img| img.dimensions());
    tracing::info!(traces = traces.len(), masks = masks.len(), dir = %out_dir.display(), "results written");

    Ok(Report {
        image: session.source_name().map(str::to_owned),
        width,
        height,
        mode,
        palette: session.palette().to_vec(),
        masks,
        traces,
        merged,
        error: None,
    })
}
