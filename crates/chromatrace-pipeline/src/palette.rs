//! Dominant color extraction.
//!
//! [`PaletteExtractor`] is the seam: given a decoded image and a palette
//! size, return the most representative colors, most dominant first.
//! [`MedianCut`] is the built-in strategy, a modified median cut over a
//! 5-bit-per-channel histogram in the style of the common "color thief"
//! quantizer.
//!
//! The output order is significant downstream: masks and traces are
//! produced in palette order and displayed in palette order.

use image::RgbaImage;

use crate::color::Rgb;
use crate::types::PipelineConfig;

/// Bits kept per channel when building the histogram.
const SIGNIFICANT_BITS: u32 = 5;
/// Right shift that maps an 8-bit channel into the histogram.
const RIGHT_SHIFT: u32 = 8 - SIGNIFICANT_BITS;
/// Cells per histogram axis.
const AXIS_CELLS: usize = 1 << SIGNIFICANT_BITS;
/// Pixels with alpha below this are not sampled.
const MIN_ALPHA: u8 = 125;
/// Pixels with every channel above this are treated as background white.
const WHITE_CUTOFF: u8 = 250;

/// Strategy for extracting a ranked palette from an image.
pub trait PaletteExtractor {
    /// Return at most `count` colors, most dominant first.
    fn extract(&self, image: &RgbaImage, count: usize) -> Vec<Rgb>;
}

/// Modified median cut quantizer.
///
/// Deterministic: the same image and parameters always produce the same
/// palette in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedianCut {
    /// Sample every `quality`-th pixel (clamped to at least 1).
    pub quality: usize,
}

impl Default for MedianCut {
    fn default() -> Self {
        Self {
            quality: PipelineConfig::DEFAULT_PALETTE_QUALITY,
        }
    }
}

impl PaletteExtractor for MedianCut {
    fn extract(&self, image: &RgbaImage, count: usize) -> Vec<Rgb> {
        if count == 0 {
            return Vec::new();
        }

        let mut histogram = Histogram::sample(image, self.quality.max(1), true);
        if histogram.total == 0 {
            // Nothing but transparency or white: sample everything.
            histogram = Histogram::sample(image, 1, false);
        }
        if histogram.total == 0 {
            return Vec::new();
        }

        let mut boxes = vec![ColorBox::enclosing(&histogram)];
        while boxes.len() < count {
            let Some(index) = pick_box_to_split(&boxes) else {
                break;
            };
            let (left, right) = boxes[index].split(&histogram);
            boxes[index] = left;
            boxes.insert(index + 1, right);
        }

        // Stable sort keeps split order for equal populations.
        boxes.sort_by(|a, b| b.population.cmp(&a.population));
        boxes.iter().map(|b| b.average(&histogram)).collect()
    }
}

/// Extract a palette using the built-in median cut and `config`'s size
/// and sampling stride.
#[must_use]
pub fn extract_palette(image: &RgbaImage, config: &PipelineConfig) -> Vec<Rgb> {
    MedianCut {
        quality: config.palette_quality,
    }
    .extract(image, config.palette_size)
}

/// Population counts of quantized colors.
struct Histogram {
    cells: Vec<u32>,
    total: u64,
}

impl Histogram {
    fn sample(image: &RgbaImage, stride: usize, filter: bool) -> Self {
        let mut cells = vec![0u32; AXIS_CELLS * AXIS_CELLS * AXIS_CELLS];
        let mut total = 0u64;
        for pixel in image.pixels().step_by(stride) {
            let [r, g, b, a] = pixel.0;
            if filter && (a < MIN_ALPHA || (r > WHITE_CUTOFF && g > WHITE_CUTOFF && b > WHITE_CUTOFF))
            {
                continue;
            }
            let idx = index(
                usize::from(r >> RIGHT_SHIFT),
                usize::from(g >> RIGHT_SHIFT),
                usize::from(b >> RIGHT_SHIFT),
            );
            cells[idx] = cells[idx].saturating_add(1);
            total += 1;
        }
        Self { cells, total }
    }

    fn get(&self, r: usize, g: usize, b: usize) -> u32 {
        self.cells[index(r, g, b)]
    }
}

const fn index(r: usize, g: usize, b: usize) -> usize {
    (r << (2 * SIGNIFICANT_BITS)) | (g << SIGNIFICANT_BITS) | b
}

/// An axis-aligned box in the quantized color cube, bounds inclusive and
/// always shrunk to the occupied cells.
#[derive(Debug, Clone, Copy)]
struct ColorBox {
    lo: [usize; 3],
    hi: [usize; 3],
    population: u64,
}

impl ColorBox {
    fn enclosing(histogram: &Histogram) -> Self {
        Self::shrink(histogram, [0; 3], [AXIS_CELLS - 1; 3])
    }

    /// Tighten `[lo, hi]` to the occupied cells and count them.
    fn shrink(histogram: &Histogram, lo: [usize; 3], hi: [usize; 3]) -> Self {
        let mut min = hi;
        let mut max = lo;
        let mut population = 0u64;
        for r in lo[0]..=hi[0] {
            for g in lo[1]..=hi[1] {
                for b in lo[2]..=hi[2] {
                    let n = histogram.get(r, g, b);
                    if n == 0 {
                        continue;
                    }
                    population += u64::from(n);
                    for (axis, v) in [r, g, b].into_iter().enumerate() {
                        min[axis] = min[axis].min(v);
                        max[axis] = max[axis].max(v);
                    }
                }
            }
        }
        if population == 0 {
            return Self {
                lo,
                hi,
                population,
            };
        }
        Self {
            lo: min,
            hi: max,
            population,
        }
    }

    fn volume(&self) -> u64 {
        (0..3)
            .map(|axis| (self.hi[axis] - self.lo[axis] + 1) as u64)
            .product()
    }

    /// Tight bounds spanning more than one cell imply two occupied cells.
    fn is_splittable(&self) -> bool {
        self.population > 1 && self.volume() > 1
    }

    fn longest_axis(&self) -> usize {
        let mut best = 0;
        for axis in 1..3 {
            if self.hi[axis] - self.lo[axis] > self.hi[best] - self.lo[best] {
                best = axis;
            }
        }
        best
    }

    /// Split at the population median along the longest axis.
    ///
    /// Both halves are non-empty: the bounds are tight, so the first and
    /// last slices along the axis are occupied and the cut lands strictly
    /// between them.
    fn split(&self, histogram: &Histogram) -> (Self, Self) {
        let axis = self.longest_axis();
        let (lo, hi) = (self.lo[axis], self.hi[axis]);

        let mut cumulative = 0u64;
        let mut cut = lo;
        for slice in lo..=hi {
            cumulative += self.slice_population(histogram, axis, slice);
            cut = slice;
            if cumulative * 2 >= self.population {
                break;
            }
        }
        let cut = cut.min(hi - 1);

        let mut left_hi = self.hi;
        left_hi[axis] = cut;
        let mut right_lo = self.lo;
        right_lo[axis] = cut + 1;
        (
            Self::shrink(histogram, self.lo, left_hi),
            Self::shrink(histogram, right_lo, self.hi),
        )
    }

    fn slice_population(&self, histogram: &Histogram, axis: usize, slice: usize) -> u64 {
        let mut lo = self.lo;
        let mut hi = self.hi;
        lo[axis] = slice;
        hi[axis] = slice;
        let mut n = 0u64;
        for r in lo[0]..=hi[0] {
            for g in lo[1]..=hi[1] {
                for b in lo[2]..=hi[2] {
                    n += u64::from(histogram.get(r, g, b));
                }
            }
        }
        n
    }

    /// Population-weighted mean of the cell centers.
    fn average(&self, histogram: &Histogram) -> Rgb {
        let cell_size = f64::from(1u32 << RIGHT_SHIFT);
        let mut sums = [0.0f64; 3];
        for r in self.lo[0]..=self.hi[0] {
            for g in self.lo[1]..=self.hi[1] {
                for b in self.lo[2]..=self.hi[2] {
                    let n = f64::from(histogram.get(r, g, b));
                    if n == 0.0 {
                        continue;
                    }
                    for (axis, v) in [r, g, b].into_iter().enumerate() {
                        #[allow(clippy::cast_precision_loss)]
                        let center = (v as f64 + 0.5) * cell_size;
                        sums[axis] += n * center;
                    }
                }
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let total = self.population.max(1) as f64;
        let channel = |sum: f64| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = (sum / total).round().clamp(0.0, 255.0) as u8;
            v
        };
        Rgb::new(channel(sums[0]), channel(sums[1]), channel(sums[2]))
    }
}

/// The splittable box with the largest population x volume, first wins ties.
fn pick_box_to_split(boxes: &[ColorBox]) -> Option<usize> {
    let mut best: Option<(usize, u128)> = None;
    for (i, b) in boxes.iter().enumerate() {
        if !b.is_splittable() {
            continue;
        }
        let score = u128::from(b.population) * u128::from(b.volume());
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}
