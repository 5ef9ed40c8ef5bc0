//! Integration test: a color run over a ten-color image, with a tracer
//! that fails partway through.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::cell::Cell;

use chromatrace_pipeline::decode::encode_png;
use chromatrace_pipeline::{Rgb, RgbaImage};
use chromatrace_session::{
    Mode, OutlineTracer, Phase, Session, SessionError, Step, TraceError, TraceParams, Tracer,
};

/// Ten vertical bands of well separated colors.
fn ten_bands_png() -> Vec<u8> {
    const BANDS: [[u8; 3]; 10] = [
        [230, 25, 75],
        [60, 180, 75],
        [255, 225, 25],
        [0, 130, 200],
        [245, 130, 48],
        [145, 30, 180],
        [70, 240, 240],
        [240, 50, 230],
        [128, 128, 0],
        [0, 0, 128],
    ];
    let img = RgbaImage::from_fn(100, 20, |x, _| {
        let [r, g, b] = BANDS[(x / 10) as usize];
        [r, g, b, 255].into()
    });
    encode_png(&img).unwrap()
}

/// Fails on the `fail_at`-th call (zero based), succeeds otherwise.
struct FailingTracer {
    calls: Cell<usize>,
    fail_at: usize,
}

impl Tracer for FailingTracer {
    fn trace(&self, image: &RgbaImage, params: &TraceParams) -> Result<String, TraceError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if call == self.fail_at {
            return Err(TraceError::Failed("potrace exploded".into()));
        }
        let fill = params.color.map_or_else(|| "black".to_owned(), Rgb::to_hex);
        Ok(format!(
            r#"<svg width="{}" height="{}"><path fill="{fill}"/></svg>"#,
            image.width(),
            image.height()
        ))
    }
}

#[test]
fn palette_has_ten_colors() {
    let mut session = Session::default();
    let palette = session.load(&ten_bands_png(), "bands.png").unwrap();
    assert_eq!(palette.len(), 10);
}

#[test]
fn failing_trace_skips_one_color_and_finishes_the_run() {
    let mut session = Session::default();
    session.load(&ten_bands_png(), "bands.png").unwrap();
    let palette = session.palette().to_vec();

    let tracer = FailingTracer {
        calls: Cell::new(0),
        fail_at: 4,
    };
    let err = session.generate(Mode::Color, &tracer).unwrap_err();

    match err {
        SessionError::Trace { color, source } => {
            assert_eq!(color, Some(palette[4]));
            assert_eq!(source, TraceError::Failed("potrace exploded".into()));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Every mask is built; only the failing color's trace is missing.
    assert_eq!(session.masks().len(), 10);
    for (mask, color) in session.masks().iter().zip(&palette) {
        assert_eq!(mask.color, *color);
    }
    let traced: Vec<_> = session.traces().iter().map(|t| t.color).collect();
    let expected: Vec<_> = palette
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != 4)
        .map(|(_, c)| Some(*c))
        .collect();
    assert_eq!(traced, expected);
    assert!(matches!(session.phase(), Phase::Error(msg) if msg.contains("potrace exploded")));
    assert_eq!(tracer.calls.get(), 10);

    // Partial results still merge.
    let merged = session.merged_svg().unwrap();
    assert_eq!(merged.matches("<path").count(), 9);
}

#[test]
fn stepping_with_outline_tracer_builds_every_mask() {
    let mut session = Session::default();
    session.load(&ten_bands_png(), "bands.png").unwrap();
    let generation = session.start(Mode::Color).unwrap();

    let mut steps = 0;
    loop {
        match session.step(generation, &OutlineTracer::default()) {
            Step::Progress { done, total } => {
                steps += 1;
                assert_eq!(done, steps);
                assert_eq!(total, 10);
            }
            Step::Finished => break,
            other => panic!("unexpected step: {other:?}"),
        }
    }

    assert_eq!(session.masks().len(), 10);
    assert_eq!(session.traces().len(), 10);
    assert_eq!(session.phase(), &Phase::Done);

    let merged = session.merged_svg().unwrap();
    assert!(merged.contains(r#"width="100" height="20""#));
    assert_eq!(merged.matches("<path").count(), 10);
}

#[test]
fn reset_mid_run_makes_remaining_steps_stale() {
    let mut session = Session::default();
    session.load(&ten_bands_png(), "bands.png").unwrap();
    let generation = session.start(Mode::Color).unwrap();
    assert!(matches!(
        session.step(generation, &OutlineTracer::default()),
        Step::Progress { .. }
    ));

    session.reset();

    assert!(matches!(
        session.step(generation, &OutlineTracer::default()),
        Step::Stale
    ));
    assert!(session.masks().is_empty());
    assert!(session.palette().is_empty());
    assert!(matches!(session.start(Mode::Color), Err(SessionError::NoImage)));
}
