//! Outline simplification with Ramer-Douglas-Peucker.
//!
//! Border following emits one point per boundary pixel. Traced SVGs
//! stay small by dropping points that lie within a tolerance of the
//! chord between their kept neighbours.
//!
//! Outlines are closed rings, so [`simplify_closed`] anchors the ring
//! at its first point and at the point farthest from it, then simplifies
//! the two open halves independently.

use crate::types::{Point, Polyline};

/// Simplify a closed ring (last point implicitly joins the first).
///
/// The result keeps at least the anchor and its farthest point, so a
/// ring never collapses below two points. Rings with fewer than 4
/// points are returned unchanged.
#[must_use = "returns the simplified ring"]
pub fn simplify_closed(ring: &Polyline, tolerance: f64) -> Polyline {
    let points = ring.points();
    if points.len() < 4 {
        return ring.clone();
    }

    let anchor = points[0];
    let far = points
        .iter()
        .enumerate()
        .skip(1)
        .fold((1, 0.0_f64), |(best, best_d), (i, &p)| {
            let d = p.distance(anchor);
            if d > best_d { (i, d) } else { (best, best_d) }
        })
        .0;

    // First half: anchor ..= far. Second half: far ..= last, then back
    // to the anchor.
    let mut second: Vec<Point> = points[far..].to_vec();
    second.push(anchor);

    let first_kept = select(&points[..=far], &rdp_mask(&points[..=far], tolerance));
    let second_kept = select(&second, &rdp_mask(&second, tolerance));

    // Drop the shared far point from the second half and the repeated
    // anchor at its end.
    let mut out = first_kept;
    out.extend_from_slice(&second_kept[1..second_kept.len() - 1]);
    Polyline::new(out)
}

fn select(points: &[Point], kept: &[bool]) -> Vec<Point> {
    points
        .iter()
        .zip(kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Which points survive RDP; endpoints always do.
fn rdp_mask(points: &[Point], tolerance: f64) -> Vec<bool> {
    let mut kept = vec![false; points.len()];
    if points.is_empty() {
        return kept;
    }
    kept[0] = true;
    kept[points.len() - 1] = true;

    // Explicit stack: border rings on large images are long enough to
    // make deep recursion a risk.
    let mut stack = vec![(0, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut max_idx = start;
        for (i, &p) in points.iter().enumerate().take(end).skip(start + 1) {
            let d = perpendicular_distance(p, points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }
        if max_dist > tolerance {
            kept[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }
    kept
}

/// Distance from `p` to the line through `a` and `b`; distance to `a`
/// when the two coincide.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);
    if length_sq == 0.0 {
        return p.distance(a);
    }
    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
