//! The generation workspace.
//!
//! A [`Session`] owns everything one upload produces: the decoded image,
//! its palette, and the masks and traces of the latest generation run.
//! Runs are driven one job at a time through [`Session::step`] so a UI
//! can yield between colors and render progress.
//!
//! Every run is tagged with a [`Generation`]. Loading, resetting or
//! starting a new run bumps the epoch, and a step presented with an older
//! token returns [`Step::Stale`] without touching any state.

use std::collections::VecDeque;

use chromatrace_export::{MergeError, merge_svgs};
use chromatrace_pipeline::{
    Dimensions, PipelineConfig, PipelineError, Rgb, RgbaImage, analyze, build_mask,
};

use crate::tracer::{TraceError, TraceParams, Tracer};

/// Which generation action was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Trace the whole image once, in black.
    #[default]
    Monochrome,
    /// Trace one mask per palette color, filled with that color.
    Color,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing loaded.
    #[default]
    Idle,
    /// Decoding the upload and extracting its palette.
    ColorExtracting,
    /// Image and palette available, no run in progress.
    Ready,
    /// A color run is about to build its next mask.
    MaskBuilding,
    /// A trace is about to run.
    Tracing,
    /// The last run completed.
    Done,
    /// Loading or the last run failed; holds the error message.
    Error(String),
}

impl Phase {
    /// Whether work is pending and generation actions should be disabled.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::ColorExtracting | Self::MaskBuilding | Self::Tracing)
    }
}

/// Epoch token identifying one load or generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// The raw epoch counter.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A binary mask of one palette color.
#[derive(Debug, Clone)]
pub struct Mask {
    /// The palette color this mask isolates.
    pub color: Rgb,
    /// Black where the source matched `color`, white elsewhere.
    pub image: RgbaImage,
}

/// One traced SVG document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceResult {
    /// Fill color; `None` for a monochrome trace.
    pub color: Option<Rgb>,
    /// The SVG document produced by the tracer.
    pub svg: String,
    /// Pixel size of the traced raster.
    pub dimensions: Dimensions,
}

/// Outcome of a single [`Session::step`].
#[derive(Debug)]
pub enum Step {
    /// One job finished and more remain.
    Progress {
        /// Jobs completed so far in this run.
        done: usize,
        /// Jobs in this run.
        total: usize,
    },
    /// The run completed; every job produced its trace.
    Finished,
    /// The run completed but at least one trace failed; holds the first
    /// failure. Every mask was still built and every other trace kept.
    Failed(SessionError),
    /// The token belongs to a superseded run; nothing was done.
    Stale,
}

/// Summary of a completed [`Session::generate`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct GenerationReport {
    /// The mode that ran.
    pub mode: Mode,
    /// Masks built (zero for monochrome runs).
    pub masks: usize,
    /// Traces produced.
    pub traces: usize,
}

/// Errors surfaced by [`Session`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A generation action was requested before any image was loaded.
    #[error("please select a valid image")]
    NoImage,

    /// The upload could not be decoded or the configuration is invalid.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The tracer failed on one job.
    #[error("tracing {} failed: {source}", target_label(.color))]
    Trace {
        /// Color being traced, `None` for monochrome.
        color: Option<Rgb>,
        /// The tracer's error.
        #[source]
        source: TraceError,
    },

    /// A load was finished with a token from a superseded epoch.
    #[error("the upload was superseded by a newer action")]
    Stale,
}

fn target_label(color: &Option<Rgb>) -> String {
    color.map_or_else(|| "image".to_owned(), Rgb::to_hex)
}

#[derive(Debug, Clone)]
struct Source {
    name: String,
    image: RgbaImage,
    palette: Vec<Rgb>,
}

#[derive(Debug, Clone, Copy)]
enum Job {
    /// Trace the full source image in black.
    Monochrome,
    /// Build the mask of a palette color and trace it in that color.
    Color(Rgb),
}

#[derive(Debug)]
struct Run {
    jobs: VecDeque<Job>,
    total: usize,
    failures: Vec<SessionError>,
}

/// Explicit workspace for one upload and its generation runs.
#[derive(Debug, Default)]
pub struct Session {
    config: PipelineConfig,
    source: Option<Source>,
    masks: Vec<Mask>,
    traces: Vec<TraceResult>,
    phase: Phase,
    generation: Generation,
    run: Option<Run>,
}

impl Session {
    /// Create an idle session with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pipeline`] if `config` fails validation.
    pub fn new(config: PipelineConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Replace the configuration. Takes effect on the next load or run.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pipeline`] if `config` fails validation;
    /// the previous configuration is kept.
    pub fn set_config(&mut self, config: PipelineConfig) -> Result<(), SessionError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Current epoch token.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// The loaded image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&RgbaImage> {
        self.source.as_ref().map(|s| &s.image)
    }

    /// Name of the loaded upload, if any.
    #[must_use]
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.name.as_str())
    }

    /// Palette of the loaded image, most significant color first.
    #[must_use]
    pub fn palette(&self) -> &[Rgb] {
        self.source
            .as_ref()
            .map(|s| s.palette.as_slice())
            .unwrap_or_default()
    }

    /// Masks of the latest color run, in palette order.
    #[must_use]
    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    /// Traces of the latest run, in job order.
    #[must_use]
    pub fn traces(&self) -> &[TraceResult] {
        &self.traces
    }

    /// `(done, total)` jobs of the run in progress, if any.
    #[must_use]
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.run
            .as_ref()
            .map(|run| (run.total - run.jobs.len(), run.total))
    }

    fn advance(&mut self) -> Generation {
        self.generation = Generation(self.generation.0 + 1);
        self.run = None;
        self.generation
    }

    fn clear_results(&mut self) {
        self.masks.clear();
        self.traces.clear();
    }

    /// Discard the current image and results and enter
    /// [`Phase::ColorExtracting`].
    ///
    /// Returns the token to hand to [`Session::finish_load`]. Splitting
    /// the load lets a UI render the extracting state before the
    /// synchronous decode.
    pub fn begin_load(&mut self) -> Generation {
        let generation = self.advance();
        self.source = None;
        self.clear_results();
        self.phase = Phase::ColorExtracting;
        generation
    }

    /// Decode `bytes` and extract the palette.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Stale`] if the session moved on since
    /// `generation` was issued, or [`SessionError::Pipeline`] if decoding
    /// fails (the session then holds no image and reports
    /// [`Phase::Error`]).
    pub fn finish_load(
        &mut self,
        generation: Generation,
        bytes: &[u8],
        name: &str,
    ) -> Result<(), SessionError> {
        if generation != self.generation {
            tracing::debug!(stale = generation.0, current = self.generation.0, "dropping stale load");
            return Err(SessionError::Stale);
        }
        match analyze(bytes, &self.config) {
            Ok(analysis) => {
                tracing::info!(
                    name,
                    width = analysis.image.width(),
                    height = analysis.image.height(),
                    colors = analysis.palette.len(),
                    "image loaded"
                );
                self.source = Some(Source {
                    name: name.to_owned(),
                    image: analysis.image,
                    palette: analysis.palette,
                });
                self.phase = Phase::Ready;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "failed to load image");
                self.phase = Phase::Error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Replace the current image with `bytes` and extract its palette.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pipeline`] if decoding fails.
    pub fn load(&mut self, bytes: &[u8], name: &str) -> Result<&[Rgb], SessionError> {
        let generation = self.begin_load();
        self.finish_load(generation, bytes, name)?;
        Ok(self.palette())
    }

    /// Start a new generation run, clearing previous masks and traces.
    ///
    /// A color run over an empty palette is immediately [`Phase::Done`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoImage`] if nothing is loaded; the session
    /// is left untouched.
    pub fn start(&mut self, mode: Mode) -> Result<Generation, SessionError> {
        let Some(source) = &self.source else {
            return Err(SessionError::NoImage);
        };
        let jobs: VecDeque<Job> = match mode {
            Mode::Monochrome => VecDeque::from([Job::Monochrome]),
            Mode::Color => source.palette.iter().copied().map(Job::Color).collect(),
        };
        let total = jobs.len();
        let first = jobs.front().copied();

        let generation = self.advance();
        self.clear_results();
        self.phase = match first {
            Some(Job::Monochrome) => Phase::Tracing,
            Some(Job::Color(_)) => Phase::MaskBuilding,
            None => Phase::Done,
        };
        if first.is_some() {
            self.run = Some(Run {
                jobs,
                total,
                failures: Vec::new(),
            });
        }
        tracing::info!(?mode, jobs = total, generation = generation.0, "generation started");
        Ok(generation)
    }

    /// Perform the next job of the run identified by `generation`.
    pub fn step(&mut self, generation: Generation, tracer: &impl Tracer) -> Step {
        if generation != self.generation {
            tracing::debug!(stale = generation.0, current = self.generation.0, "dropping stale step");
            return Step::Stale;
        }
        let Some(job) = self.run.as_mut().and_then(|run| run.jobs.pop_front()) else {
            self.run = None;
            return Step::Finished;
        };
        let Some(source) = &self.source else {
            self.run = None;
            return Step::Failed(SessionError::NoImage);
        };

        let (color, traced) = match job {
            Job::Monochrome => {
                self.phase = Phase::Tracing;
                let params = TraceParams {
                    threshold: self.config.trace_threshold,
                    color: None,
                };
                (None, trace_one(tracer, &source.image, &params))
            }
            Job::Color(color) => {
                self.phase = Phase::MaskBuilding;
                let image = build_mask(&source.image, color, self.config.match_threshold);
                self.phase = Phase::Tracing;
                let params = TraceParams {
                    threshold: self.config.trace_threshold,
                    color: Some(color),
                };
                let traced = trace_one(tracer, &image, &params);
                self.masks.push(Mask { color, image });
                (Some(color), traced)
            }
        };

        match traced {
            Ok(trace) => {
                self.traces.push(trace);
                tracing::debug!(color = %target_label(&color), "trace finished");
            }
            Err(source) => {
                let error = SessionError::Trace { color, source };
                tracing::error!(error = %error, "trace failed, continuing with the next job");
                if let Some(run) = self.run.as_mut() {
                    run.failures.push(error);
                }
            }
        }

        let (done, total) = self.progress().unwrap_or((0, 0));
        if done < total {
            self.phase = match self.run.as_ref().and_then(|r| r.jobs.front()) {
                Some(Job::Color(_)) => Phase::MaskBuilding,
                _ => Phase::Tracing,
            };
            return Step::Progress { done, total };
        }

        let failures = self.run.take().map(|r| r.failures).unwrap_or_default();
        let failed = failures.len();
        match failures.into_iter().next() {
            None => {
                self.phase = Phase::Done;
                tracing::info!(traces = self.traces.len(), "generation finished");
                Step::Finished
            }
            Some(first) => {
                self.phase = Phase::Error(first.to_string());
                tracing::warn!(
                    traces = self.traces.len(),
                    failed,
                    "generation finished with failures"
                );
                Step::Failed(first)
            }
        }
    }

    /// Run `mode` to completion with `tracer`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoImage`] if nothing is loaded, or the
    /// first trace failure once every job has run. The masks and the
    /// successful traces stay available through [`Session::masks`] and
    /// [`Session::traces`].
    pub fn generate(
        &mut self,
        mode: Mode,
        tracer: &impl Tracer,
    ) -> Result<GenerationReport, SessionError> {
        let generation = self.start(mode)?;
        loop {
            match self.step(generation, tracer) {
                Step::Progress { .. } => {}
                Step::Finished | Step::Stale => break,
                Step::Failed(e) => return Err(e),
            }
        }
        Ok(GenerationReport {
            mode,
            masks: self.masks.len(),
            traces: self.traces.len(),
        })
    }

    /// Drop the image, palette and results and return to
    /// [`Phase::Idle`]. Any in-flight run becomes stale.
    pub fn reset(&mut self) {
        let generation = self.advance();
        self.source = None;
        self.clear_results();
        self.phase = Phase::Idle;
        tracing::debug!(generation = generation.0, "session reset");
    }

    /// Merge every trace into one document, in trace order.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError`] if a trace is not well-formed SVG.
    pub fn merged_svg(&self) -> Result<String, MergeError> {
        let svgs: Vec<&str> = self.traces.iter().map(|t| t.svg.as_str()).collect();
        merge_svgs(&svgs)
    }
}

fn trace_one(
    tracer: &impl Tracer,
    image: &RgbaImage,
    params: &TraceParams,
) -> Result<TraceResult, TraceError> {
    let svg = tracer.trace(image, params)?;
    Ok(TraceResult {
        color: params.color,
        svg,
        dimensions: Dimensions::of(image),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::tracer::OutlineTracer;
    use chromatrace_pipeline::decode::encode_png;

    struct Echo;

    impl Tracer for Echo {
        fn trace(&self, image: &RgbaImage, params: &TraceParams) -> Result<String, TraceError> {
            let fill = params.color.map_or_else(|| "black".to_owned(), Rgb::to_hex);
            Ok(format!(
                r#"<svg width="{}" height="{}"><path fill="{fill}"/></svg>"#,
                image.width(),
                image.height()
            ))
        }
    }

    fn stripes_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(30, 10, |x, _| match x / 10 {
            0 => [200, 30, 30, 255].into(),
            1 => [30, 200, 30, 255].into(),
            _ => [30, 30, 200, 255].into(),
        });
        encode_png(&img).unwrap()
    }

    fn loaded() -> Session {
        let mut session = Session::default();
        session.load(&stripes_png(), "stripes.png").unwrap();
        session
    }

    #[test]
    fn new_session_is_idle() {
        let session = Session::default();
        assert_eq!(session.phase(), &Phase::Idle);
        assert!(session.palette().is_empty());
        assert!(session.image().is_none());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = PipelineConfig {
            palette_size: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Session::new(config),
            Err(SessionError::Pipeline(PipelineError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn load_extracts_palette() {
        let session = loaded();
        assert_eq!(session.phase(), &Phase::Ready);
        assert_eq!(session.palette().len(), 3);
        assert_eq!(session.source_name(), Some("stripes.png"));
    }

    #[test]
    fn load_failure_reports_error_phase() {
        let mut session = loaded();
        let err = session.load(&[1, 2, 3], "junk.bin").unwrap_err();
        assert!(matches!(err, SessionError::Pipeline(PipelineError::ImageDecode(_))));
        assert!(matches!(session.phase(), Phase::Error(_)));
        assert!(session.image().is_none());
    }

    #[test]
    fn start_without_image_fails() {
        let mut session = Session::default();
        assert!(matches!(session.start(Mode::Color), Err(SessionError::NoImage)));
        assert_eq!(session.phase(), &Phase::Idle);
    }

    #[test]
    fn monochrome_run_traces_once_in_black() {
        let mut session = loaded();
        let report = session.generate(Mode::Monochrome, &Echo).unwrap();
        assert_eq!(report.masks, 0);
        assert_eq!(report.traces, 1);
        assert_eq!(session.traces()[0].color, None);
        assert!(session.traces()[0].svg.contains(r#"fill="black""#));
        assert_eq!(session.phase(), &Phase::Done);
    }

    #[test]
    fn color_run_yields_one_mask_and_trace_per_color() {
        let mut session = loaded();
        let report = session.generate(Mode::Color, &Echo).unwrap();
        assert_eq!(report.masks, 3);
        assert_eq!(report.traces, 3);
        for (i, color) in session.palette().iter().enumerate() {
            assert_eq!(session.masks()[i].color, *color);
            assert_eq!(session.traces()[i].color, Some(*color));
        }
    }

    #[test]
    fn steps_report_progress() {
        let mut session = loaded();
        let generation = session.start(Mode::Color).unwrap();
        assert_eq!(session.phase(), &Phase::MaskBuilding);
        assert!(matches!(
            session.step(generation, &Echo),
            Step::Progress { done: 1, total: 3 }
        ));
        assert_eq!(session.masks().len(), 1);
        assert!(matches!(
            session.step(generation, &Echo),
            Step::Progress { done: 2, total: 3 }
        ));
        assert!(matches!(session.step(generation, &Echo), Step::Finished));
        assert_eq!(session.progress(), None);
    }

    /// Fails its first call, echoes the rest.
    struct FailFirst(std::cell::Cell<bool>);

    impl Tracer for FailFirst {
        fn trace(&self, image: &RgbaImage, params: &TraceParams) -> Result<String, TraceError> {
            if self.0.replace(false) {
                return Err(TraceError::Failed("nope".into()));
            }
            Echo.trace(image, params)
        }
    }

    #[test]
    fn failed_trace_does_not_stop_the_run() {
        let mut session = loaded();
        let first = session.palette()[0];
        let tracer = FailFirst(std::cell::Cell::new(true));
        let generation = session.start(Mode::Color).unwrap();
        let failure = loop {
            match session.step(generation, &tracer) {
                Step::Progress { .. } => {}
                Step::Failed(e) => break e,
                other => panic!("unexpected step: {other:?}"),
            }
        };
        assert!(matches!(
            failure,
            SessionError::Trace { color: Some(c), .. } if c == first
        ));
        assert_eq!(session.masks().len(), 3);
        assert_eq!(session.traces().len(), 2);
        assert!(session.traces().iter().all(|t| t.color != Some(first)));
        assert!(matches!(session.phase(), Phase::Error(_)));
        assert_eq!(session.progress(), None);
    }

    #[test]
    fn regenerate_clears_previous_results() {
        let mut session = loaded();
        session.generate(Mode::Color, &Echo).unwrap();
        session.generate(Mode::Monochrome, &Echo).unwrap();
        assert!(session.masks().is_empty());
        assert_eq!(session.traces().len(), 1);
    }

    #[test]
    fn stale_step_does_not_mutate() {
        let mut session = loaded();
        let old = session.start(Mode::Color).unwrap();
        let _ = session.step(old, &Echo);
        session.reset();
        assert!(matches!(session.step(old, &Echo), Step::Stale));
        assert!(session.masks().is_empty());
        assert!(session.traces().is_empty());
        assert_eq!(session.phase(), &Phase::Idle);
    }

    #[test]
    fn new_run_supersedes_old_token() {
        let mut session = loaded();
        let old = session.start(Mode::Color).unwrap();
        let new = session.start(Mode::Monochrome).unwrap();
        assert_ne!(old, new);
        assert!(matches!(session.step(old, &Echo), Step::Stale));
        assert!(matches!(session.step(new, &Echo), Step::Finished));
        assert_eq!(session.traces().len(), 1);
    }

    #[test]
    fn stale_load_is_rejected() {
        let mut session = Session::default();
        let token = session.begin_load();
        session.reset();
        let result = session.finish_load(token, &stripes_png(), "late.png");
        assert!(matches!(result, Err(SessionError::Stale)));
        assert!(session.image().is_none());
    }

    #[test]
    fn merged_svg_combines_traces() {
        let mut session = loaded();
        session.generate(Mode::Color, &Echo).unwrap();
        let merged = session.merged_svg().unwrap();
        assert!(merged.contains(r#"width="30" height="10""#));
        assert_eq!(merged.matches("<path").count(), 3);
    }

    #[test]
    fn outline_tracer_traces_masks() {
        let mut session = loaded();
        session.generate(Mode::Color, &OutlineTracer::default()).unwrap();
        for trace in session.traces() {
            let hex = trace.color.unwrap().to_hex();
            assert!(trace.svg.contains(&format!("fill=\"{hex}\"")));
            assert!(trace.svg.contains("<path"), "stripe {hex} traced nothing");
        }
    }

    #[test]
    fn trace_error_message_names_color() {
        let error = SessionError::Trace {
            color: Some(Rgb::new(255, 0, 0)),
            source: TraceError::EmptyImage,
        };
        assert!(error.to_string().contains("#FF0000"));
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Color).unwrap(), r#""color""#);
    }
}
