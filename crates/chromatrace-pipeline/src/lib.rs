//! chromatrace-pipeline: Pure pixel pipeline (sans-IO).
//!
//! Turns uploaded image bytes into the inputs of per-color tracing:
//! decode -> palette extraction -> per-color masks, plus the outline
//! geometry used by the built-in tracer.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and pixel buffers. Browser and filesystem interaction
//! lives in `chromatrace-io` and `chromatrace-cli`.

pub mod color;
pub mod contour;
pub mod decode;
pub mod distance;
pub mod mask;
pub mod outline;
pub mod palette;
pub mod simplify;
pub mod types;

pub use color::{ColorParseError, Rgb};
pub use contour::{Border, ContourTracer, ContourTracerKind, Outline};
pub use distance::{DEFAULT_MATCH_THRESHOLD, color_distance, is_color_match};
pub use mask::build_mask;
pub use outline::{OutlineConfig, Outlines, trace_outlines};
pub use palette::{MedianCut, PaletteExtractor, extract_palette};
pub use types::{Dimensions, PipelineConfig, PipelineError, Point, Polyline, RgbaImage};

/// A decoded upload together with its ranked palette.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The decoded source image.
    pub image: RgbaImage,
    /// Dominant colors, most significant first.
    pub palette: Vec<Rgb>,
}

/// Decode `image_bytes` and extract its palette.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation,
/// [`PipelineError::EmptyInput`] for empty input and
/// [`PipelineError::ImageDecode`] for undecodable input.
pub fn analyze(image_bytes: &[u8], config: &PipelineConfig) -> Result<Analysis, PipelineError> {
    config.validate()?;
    let image = decode::decode(image_bytes)?;
    let palette = extract_palette(&image, config);
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        colors = palette.len(),
        "analyzed image"
    );
    Ok(Analysis { image, palette })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn two_tone_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                image::Rgba([200, 30, 30, 255])
            } else {
                image::Rgba([30, 30, 200, 255])
            }
        });
        decode::encode_png(&img).unwrap()
    }

    #[test]
    fn analyze_empty_input() {
        let result = analyze(&[], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn analyze_corrupt_input() {
        let result = analyze(&[0xFF, 0x00], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn analyze_rejects_invalid_config() {
        let config = PipelineConfig {
            palette_size: 0,
            ..PipelineConfig::default()
        };
        let result = analyze(&two_tone_png(), &config);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn analyze_two_tone_image() {
        let analysis = analyze(&two_tone_png(), &PipelineConfig::default()).unwrap();
        assert_eq!(analysis.image.dimensions(), (20, 10));
        assert_eq!(analysis.palette.len(), 2);
    }
}
