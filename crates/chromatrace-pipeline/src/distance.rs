//! Perceptual color matching.
//!
//! Colors are compared in CIE Lab (D65) with the CIEDE2000 difference
//! formula rather than by raw RGB distance, so "same color" follows
//! human vision: dark shades that differ by a few RGB steps match,
//! while saturated hues with similar RGB sums do not.

use palette::color_difference::Ciede2000;
use palette::white_point::D65;
use palette::{FromColor, Lab, Srgb};

use crate::color::Rgb;

/// CIEDE2000 distance below which two colors are considered the same.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 10.0;

/// Convert an 8-bit sRGB color into CIE Lab under D65.
#[must_use]
pub fn to_lab(color: Rgb) -> Lab<D65, f32> {
    let srgb: Srgb<f32> = Srgb::new(color.r, color.g, color.b).into_format();
    Lab::from_color(srgb)
}

/// CIEDE2000 difference between two colors.
///
/// Zero for identical colors, roughly 100 between black and white.
#[must_use]
pub fn color_distance(a: Rgb, b: Rgb) -> f32 {
    to_lab(a).difference(to_lab(b))
}

/// Whether `pixel` is perceptually the same color as `target`.
///
/// True iff the CIEDE2000 distance is strictly below `threshold`.
/// Identical colors always match, even at a threshold of 0.
#[must_use]
pub fn is_color_match(pixel: Rgb, target: Rgb, threshold: f32) -> bool {
    pixel == target || color_distance(pixel, target) < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_and_white_do_not_match() {
        assert!(!is_color_match(
            Rgb::BLACK,
            Rgb::WHITE,
            DEFAULT_MATCH_THRESHOLD
        ));
    }

    #[test]
    fn near_black_matches_black() {
        assert!(is_color_match(
            Rgb::BLACK,
            Rgb::new(1, 1, 1),
            DEFAULT_MATCH_THRESHOLD
        ));
    }

    #[test]
    fn every_color_matches_itself_at_any_threshold() {
        let samples = [
            Rgb::BLACK,
            Rgb::WHITE,
            Rgb::new(255, 0, 0),
            Rgb::new(0, 128, 255),
            Rgb::new(0xE3, 0xD4, 0xC4),
            Rgb::new(17, 200, 33),
        ];
        for c in samples {
            for threshold in [0.0, 0.5, 10.0, 100.0] {
                assert!(is_color_match(c, c, threshold), "{c} at {threshold}");
            }
        }
    }

    #[test]
    fn zero_threshold_rejects_distinct_colors() {
        assert!(!is_color_match(Rgb::BLACK, Rgb::new(1, 1, 1), 0.0));
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_identity() {
        let a = Rgb::new(200, 30, 90);
        let b = Rgb::new(20, 180, 60);
        assert!(color_distance(a, a).abs() < 1e-4);
        assert!((color_distance(a, b) - color_distance(b, a)).abs() < 1e-3);
    }

    #[test]
    fn black_white_distance_is_large() {
        let d = color_distance(Rgb::BLACK, Rgb::WHITE);
        assert!(d > 90.0, "got {d}");
    }

    #[test]
    fn saturated_hues_are_far_apart() {
        let red = Rgb::new(255, 0, 0);
        let green = Rgb::new(0, 255, 0);
        assert!(!is_color_match(red, green, DEFAULT_MATCH_THRESHOLD));
    }

    #[test]
    fn lab_of_white_is_near_full_lightness() {
        let lab = to_lab(Rgb::WHITE);
        assert!((lab.l - 100.0).abs() < 0.5, "L = {}", lab.l);
    }
}
