//! Contour extraction: closed outlines of the foreground regions of a
//! binary map.
//!
//! [`ContourTracer`] is the strategy seam; [`ContourTracerKind`] selects
//! an implementation at runtime. Both outer borders and hole borders
//! are returned so that an even-odd fill reproduces holes.

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::types::{Point, Polyline};

/// Outlines with fewer points than this enclose no area.
const MIN_OUTLINE_POINTS: usize = 3;

/// Selects which contour tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContourTracerKind {
    /// Suzuki-Abe border following via `imageproc::contours::find_contours`.
    #[default]
    BorderFollowing,
}

/// Which side of a region an outline bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Border {
    /// Outer boundary of a foreground region.
    Outer,
    /// Boundary of a background hole inside a region.
    Hole,
}

/// A closed outline: the last point connects back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    /// Points along the border in tracing order.
    pub path: Polyline,
    /// Outer border or hole border.
    pub border: Border,
}

/// Trait for contour tracing strategies.
///
/// Input: a binary map (non-zero = foreground).
/// Output: every closed border with enough points to enclose area.
pub trait ContourTracer {
    /// Trace the borders of the foreground regions.
    fn trace(&self, foreground: &GrayImage) -> Vec<Outline>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, foreground: &GrayImage) -> Vec<Outline> {
        match *self {
            Self::BorderFollowing => trace_border_following(foreground),
        }
    }
}

fn trace_border_following(foreground: &GrayImage) -> Vec<Outline> {
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(foreground);

    contours
        .into_iter()
        .filter(|c| c.points.len() >= MIN_OUTLINE_POINTS)
        .map(|c| {
            let border = match c.border_type {
                BorderType::Outer => Border::Outer,
                BorderType::Hole => Border::Hole,
            };
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            Outline {
                path: Polyline::new(points),
                border,
            }
        })
        .collect()
}
