//! Shared types for the chromatrace pixel pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference binary
/// foreground maps without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference decoded
/// sources and masks without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy).sqrt()
    }
}

/// A sequence of connected points.
///
/// Outlines produced by the tracer are implicitly closed: the last point
/// connects back to the first when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an RGBA image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Tunables shared by the palette extractor, the mask builder and the
/// built-in outline tracer.
///
/// Every field has an associated `DEFAULT_*` constant so front ends
/// (CLI flags, UI) can reference the same values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of palette colors to extract. One mask and one trace are
    /// produced per color in color mode.
    pub palette_size: usize,

    /// Sampling stride for the palette extractor: every `palette_quality`-th
    /// pixel is considered. 1 samples every pixel.
    pub palette_quality: usize,

    /// CIEDE2000 distance below which a pixel counts as the target color.
    pub match_threshold: f32,

    /// Luminance cutoff for the tracer: pixels darker than this are ink.
    pub trace_threshold: u8,

    /// Ramer-Douglas-Peucker tolerance (pixels) applied to traced outlines.
    pub simplify_tolerance: f64,
}

impl PipelineConfig {
    /// Default palette size.
    pub const DEFAULT_PALETTE_SIZE: usize = 10;
    /// Default palette sampling stride.
    pub const DEFAULT_PALETTE_QUALITY: usize = 10;
    /// Default color match threshold.
    pub const DEFAULT_MATCH_THRESHOLD: f32 = crate::distance::DEFAULT_MATCH_THRESHOLD;
    /// Default tracer luminance threshold.
    pub const DEFAULT_TRACE_THRESHOLD: u8 = 200;
    /// Default outline simplification tolerance.
    pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 1.0;

    /// Check the configuration for values the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.palette_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "palette_size must be at least 1".into(),
            ));
        }
        if self.palette_quality == 0 {
            return Err(PipelineError::InvalidConfig(
                "palette_quality must be at least 1".into(),
            ));
        }
        if !self.match_threshold.is_finite() || self.match_threshold < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "match_threshold must be a non-negative number, got {}",
                self.match_threshold
            )));
        }
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "simplify_tolerance must be a non-negative number, got {}",
                self.simplify_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            palette_size: Self::DEFAULT_PALETTE_SIZE,
            palette_quality: Self::DEFAULT_PALETTE_QUALITY,
            match_threshold: Self::DEFAULT_MATCH_THRESHOLD,
            trace_threshold: Self::DEFAULT_TRACE_THRESHOLD,
            simplify_tolerance: Self::DEFAULT_SIMPLIFY_TOLERANCE,
        }
    }
}

/// Errors that can occur in the pixel pipeline.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

/// Serde-compatible proxy for `PipelineError`.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    InvalidConfig(String),
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::InvalidConfig(s) => PipelineErrorProxy::InvalidConfig(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed image error cannot be rebuilt; keep its message.
            PipelineErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
        })
    }
}
