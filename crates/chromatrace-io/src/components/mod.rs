//! Dioxus UI components for chromatrace.
//!
//! Upload zone, palette strip, mask and trace galleries and the merged
//! preview.

mod masks;
mod merged;
mod palette;
mod traces;
mod upload;

pub use masks::{MaskGallery, MaskPreview};
pub use merged::MergedPreview;
pub use palette::PaletteStrip;
pub use traces::TraceGallery;
pub use upload::{FileUpload, INVALID_IMAGE_MESSAGE};
