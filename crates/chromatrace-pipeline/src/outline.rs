//! Raster to closed outlines: the geometry half of the built-in tracer.
//!
//! Follows the potrace convention of dark ink on light paper: pixels
//! whose luma is strictly below the threshold are foreground. Masks
//! (black = matched color) therefore trace to the silhouette of their
//! color, and a photo traced directly yields its dark regions.

use image::{GrayImage, Luma, Pixel, RgbaImage};

use crate::contour::{ContourTracer, ContourTracerKind, Outline};
use crate::simplify::simplify_closed;
use crate::types::Dimensions;

/// Parameters of outline extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineConfig {
    /// Luma cutoff: pixels darker than this are ink.
    pub threshold: u8,
    /// RDP tolerance in pixels; 0 keeps every border pixel.
    pub simplify_tolerance: f64,
    /// Border following strategy.
    pub contour_tracer: ContourTracerKind,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            threshold: crate::PipelineConfig::DEFAULT_TRACE_THRESHOLD,
            simplify_tolerance: crate::PipelineConfig::DEFAULT_SIMPLIFY_TOLERANCE,
            contour_tracer: ContourTracerKind::default(),
        }
    }
}

/// Closed outlines of an image's ink, with the image's size.
#[derive(Debug, Clone, PartialEq)]
pub struct Outlines {
    /// Outer and hole borders, simplified.
    pub outlines: Vec<Outline>,
    /// Source dimensions; the traced SVG uses them for its viewport.
    pub dimensions: Dimensions,
}

/// Binary ink map: 255 where luma < `threshold` and alpha is non-zero,
/// 0 elsewhere.
#[must_use]
pub fn threshold_foreground(image: &RgbaImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y);
        let ink = pixel.0[3] > 0 && pixel.to_luma().0[0] < threshold;
        Luma([if ink { 255 } else { 0 }])
    })
}

/// Threshold `image`, follow the borders of its ink and simplify them.
#[must_use]
pub fn trace_outlines(image: &RgbaImage, config: &OutlineConfig) -> Outlines {
    let foreground = threshold_foreground(image, config.threshold);
    let outlines = config
        .contour_tracer
        .trace(&foreground)
        .into_iter()
        .map(|o| Outline {
            path: simplify_closed(&o.path, config.simplify_tolerance),
            border: o.border,
        })
        .collect();
    Outlines {
        outlines,
        dimensions: Dimensions::of(image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Border;
    use image::Rgba;

    fn dark_square_on_white(size: u32, from: u32, to: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            if (from..to).contains(&x) && (from..to).contains(&y) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn dark_pixels_are_ink() {
        let img = dark_square_on_white(6, 2, 4);
        let fg = threshold_foreground(&img, 200);
        assert_eq!(fg.get_pixel(3, 3).0[0], 255);
        assert_eq!(fg.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn transparent_pixels_are_never_ink() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));
        let fg = threshold_foreground(&img, 200);
        assert!(fg.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn threshold_is_strict() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        assert_eq!(threshold_foreground(&img, 100).get_pixel(0, 0).0[0], 0);
        assert_eq!(threshold_foreground(&img, 101).get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn square_traces_to_simplified_outer_border() {
        let img = dark_square_on_white(30, 10, 20);
        let out = trace_outlines(&img, &OutlineConfig::default());
        assert_eq!(out.dimensions, Dimensions { width: 30, height: 30 });
        assert_eq!(out.outlines.len(), 1);
        assert_eq!(out.outlines[0].border, Border::Outer);
        assert!(
            out.outlines[0].path.len() <= 8,
            "expected corners only, got {} points",
            out.outlines[0].path.len()
        );
    }

    #[test]
    fn blank_page_has_no_outlines() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        assert!(trace_outlines(&img, &OutlineConfig::default()).outlines.is_empty());
    }
}
