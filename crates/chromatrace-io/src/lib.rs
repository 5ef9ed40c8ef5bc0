//! chromatrace-io: Browser I/O and Dioxus component library.
//!
//! Handles file uploads, Blob downloads, clipboard writes, mask preview
//! encoding and alerts, and provides the UI components of the
//! chromatrace web application.

pub mod clipboard;
pub mod components;
pub mod download;
pub mod notify;
pub mod raster;

pub use components::{
    FileUpload, INVALID_IMAGE_MESSAGE, MaskGallery, MaskPreview, MergedPreview, PaletteStrip,
    TraceGallery,
};
