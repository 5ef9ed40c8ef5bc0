//! chromatrace-export: Pure SVG serializers (sans-IO)
//!
//! Converts traced outlines into SVG documents and merges several
//! independently traced documents into one.

pub mod merge;
pub mod svg;

pub use merge::{MergeError, merge_svgs};
pub use svg::{SvgMetadata, build_path_data, to_svg};
