//! The raster-to-SVG tracer seam.
//!
//! The orchestrator treats tracing as an opaque service: an image and a
//! [`TraceParams`] in, one SVG document (or a [`TraceError`]) out.
//! [`OutlineTracer`] is the built-in implementation: threshold the
//! image, follow the ink borders and fill them with the requested color.

use serde::{Deserialize, Serialize};

use chromatrace_export::{SvgMetadata, to_svg};
use chromatrace_pipeline::{
    ContourTracerKind, OutlineConfig, PipelineConfig, Rgb, RgbaImage, trace_outlines,
};

/// Parameters of a single trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceParams {
    /// Luma cutoff: pixels darker than this are traced.
    pub threshold: u8,
    /// Fill color of the silhouette; `None` traces in black.
    pub color: Option<Rgb>,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            threshold: PipelineConfig::DEFAULT_TRACE_THRESHOLD,
            color: None,
        }
    }
}

/// Errors reported by a tracer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TraceError {
    /// The image has zero width or height.
    #[error("cannot trace an image with no pixels")]
    EmptyImage,

    /// The tracer failed for another reason.
    #[error("tracer failed: {0}")]
    Failed(String),
}

/// A raster-to-SVG tracing service.
pub trait Tracer {
    /// Trace `image` into one SVG document.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError`] if the image cannot be traced.
    fn trace(&self, image: &RgbaImage, params: &TraceParams) -> Result<String, TraceError>;
}

impl<T: Tracer + ?Sized> Tracer for &T {
    fn trace(&self, image: &RgbaImage, params: &TraceParams) -> Result<String, TraceError> {
        (**self).trace(image, params)
    }
}

/// Built-in tracer: threshold -> border following -> RDP -> filled path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineTracer {
    /// RDP tolerance in pixels.
    pub simplify_tolerance: f64,
    /// Border following strategy.
    pub contour_tracer: ContourTracerKind,
}

impl OutlineTracer {
    /// Tracer using `config`'s simplification tolerance.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            simplify_tolerance: config.simplify_tolerance,
            ..Self::default()
        }
    }
}

impl Default for OutlineTracer {
    fn default() -> Self {
        Self {
            simplify_tolerance: PipelineConfig::DEFAULT_SIMPLIFY_TOLERANCE,
            contour_tracer: ContourTracerKind::default(),
        }
    }
}

impl Tracer for OutlineTracer {
    fn trace(&self, image: &RgbaImage, params: &TraceParams) -> Result<String, TraceError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(TraceError::EmptyImage);
        }
        let outlines = trace_outlines(
            image,
            &OutlineConfig {
                threshold: params.threshold,
                simplify_tolerance: self.simplify_tolerance,
                contour_tracer: self.contour_tracer,
            },
        );
        Ok(to_svg(&outlines, params.color, &SvgMetadata::default()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ink_blob() -> RgbaImage {
        RgbaImage::from_fn(20, 10, |x, y| {
            if (4..12).contains(&x) && (2..8).contains(&y) {
                [0, 0, 0, 255].into()
            } else {
                [255, 255, 255, 255].into()
            }
        })
    }

    #[test]
    fn default_params() {
        let params = TraceParams::default();
        assert_eq!(params.threshold, 200);
        assert_eq!(params.color, None);
    }

    #[test]
    fn empty_image_is_rejected() {
        let result = OutlineTracer::default().trace(&RgbaImage::new(0, 5), &TraceParams::default());
        assert_eq!(result, Err(TraceError::EmptyImage));
    }

    #[test]
    fn monochrome_trace_is_black_filled_svg() {
        let svg = OutlineTracer::default()
            .trace(&ink_blob(), &TraceParams::default())
            .unwrap();
        assert!(svg.contains(r#"width="20""#));
        assert!(svg.contains(r#"fill="black""#));
        assert!(svg.contains("<path"));
    }

    #[test]
    fn colored_trace_uses_requested_fill() {
        let params = TraceParams {
            color: Some(Rgb::new(0xD4, 0xAC, 0x9C)),
            ..TraceParams::default()
        };
        let svg = OutlineTracer::default().trace(&ink_blob(), &params).unwrap();
        assert!(svg.contains("fill=\"#D4AC9C\""));
    }

    #[test]
    fn threshold_zero_traces_nothing() {
        let params = TraceParams {
            threshold: 0,
            color: None,
        };
        let svg = OutlineTracer::default().trace(&ink_blob(), &params).unwrap();
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn tracer_works_through_references() {
        let tracer = OutlineTracer::default();
        let by_ref: &dyn Tracer = &tracer;
        assert!(by_ref.trace(&ink_blob(), &TraceParams::default()).is_ok());
    }

    #[test]
    fn trace_error_serializes() {
        let json = serde_json::to_string(&TraceError::Failed("boom".into())).unwrap();
        let back: TraceError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TraceError::Failed("boom".into()));
    }
}
