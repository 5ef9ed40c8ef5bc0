//! chromatrace-session: generation orchestration (sans-IO).
//!
//! Holds the explicit workspace a front end drives: load an upload,
//! start a monochrome or per-color run, step it job by job and merge the
//! results. Tracing itself sits behind the [`Tracer`] trait.

pub mod session;
pub mod tracer;

pub use session::{
    Generation, GenerationReport, Mask, Mode, Phase, Session, SessionError, Step, TraceResult,
};
pub use tracer::{OutlineTracer, TraceError, TraceParams, Tracer};
