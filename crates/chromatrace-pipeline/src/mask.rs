//! Per-color binary masks.
//!
//! A mask isolates the pixels of one palette color: every pixel that
//! perceptually matches the target becomes pure black, everything else
//! pure white. Black-on-white is what the tracer treats as ink, so a
//! mask traces to the silhouette of its color.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};

use crate::color::Rgb;
use crate::decode;
use crate::distance::is_color_match;
use crate::types::PipelineError;

/// Build the black/white mask of `image` against `target`.
///
/// The output has the same dimensions as the input. RGB channels are
/// forced to `(0, 0, 0)` for matching pixels and `(255, 255, 255)`
/// otherwise; alpha is copied through and plays no part in matching.
///
/// Pixels are independent, so the result does not depend on traversal
/// order. Verdicts are memoized per distinct source color.
#[must_use]
pub fn build_mask(image: &RgbaImage, target: Rgb, threshold: f32) -> RgbaImage {
    let mut verdicts: HashMap<[u8; 3], bool> = HashMap::new();
    let mut mask = image.clone();
    for pixel in mask.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let matched = *verdicts
            .entry([r, g, b])
            .or_insert_with(|| is_color_match(Rgb::new(r, g, b), target, threshold));
        let v = if matched { 0 } else { 255 };
        *pixel = Rgba([v, v, v, a]);
    }
    mask
}

/// Decode `bytes` and build the mask of the result against `target`.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// when the source cannot be decoded; no partial mask is produced.
pub fn build_mask_from_bytes(
    bytes: &[u8],
    target: Rgb,
    threshold: f32,
) -> Result<RgbaImage, PipelineError> {
    let image = decode::decode(bytes)?;
    Ok(build_mask(&image, target, threshold))
}
