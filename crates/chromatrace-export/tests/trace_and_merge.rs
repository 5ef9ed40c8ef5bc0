//! Integration test: palette -> masks -> outlines -> SVG -> merged SVG on
//! a synthetic two-color image.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chromatrace_export::{SvgMetadata, merge_svgs, to_svg};
use chromatrace_pipeline::{
    OutlineConfig, PipelineConfig, Rgb, build_mask, decode, trace_outlines,
};
use image::{Rgba, RgbaImage};

/// White page with a red square on the left and a blue square on the right.
fn two_squares() -> RgbaImage {
    RgbaImage::from_fn(60, 30, |x, y| {
        if (5..25).contains(&x) && (5..25).contains(&y) {
            Rgba([220, 20, 20, 255])
        } else if (35..55).contains(&x) && (5..25).contains(&y) {
            Rgba([20, 20, 220, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

#[test]
fn per_color_traces_merge_into_one_document() {
    let png = decode::encode_png(&two_squares()).unwrap();
    let analysis = chromatrace_pipeline::analyze(&png, &PipelineConfig::default())
        .expect("analysis should succeed");

    // White is skipped by the extractor, so only the two squares remain.
    assert_eq!(analysis.palette.len(), 2, "palette: {:?}", analysis.palette);

    let traces: Vec<String> = analysis
        .palette
        .iter()
        .map(|&color| {
            let mask = build_mask(&analysis.image, color, PipelineConfig::DEFAULT_MATCH_THRESHOLD);
            let outlines = trace_outlines(&mask, &OutlineConfig::default());
            assert_eq!(outlines.outlines.len(), 1, "one square per color");
            to_svg(&outlines, Some(color), &SvgMetadata::default())
        })
        .collect();

    for (svg, color) in traces.iter().zip(&analysis.palette) {
        assert!(svg.contains(&format!("fill=\"{}\"", color.to_hex())));
    }

    let merged = merge_svgs(&traces).unwrap();
    assert!(merged.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"60\" height=\"30\">"));
    assert_eq!(merged.matches("<path").count(), 2);
    assert!(!merged.contains("<?xml"));
}

#[test]
fn mask_trace_covers_only_its_color() {
    let image = two_squares();
    let red = Rgb::new(220, 20, 20);
    let mask = build_mask(&image, red, PipelineConfig::DEFAULT_MATCH_THRESHOLD);
    let outlines = trace_outlines(
        &mask,
        &OutlineConfig {
            simplify_tolerance: 0.0,
            ..OutlineConfig::default()
        },
    );
    assert_eq!(outlines.outlines.len(), 1);
    for p in outlines.outlines[0].path.points() {
        assert!(p.x < 30.0, "red outline strayed into the blue square: {p:?}");
    }
}
