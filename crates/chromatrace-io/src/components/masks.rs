//! Gallery of per-color masks.

use chromatrace_pipeline::Rgb;
use dioxus::prelude::*;

/// A mask ready for display: its color and a PNG Blob URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPreview {
    /// The palette color the mask isolates.
    pub color: Rgb,
    /// Object URL of the encoded mask (see [`crate::raster`]).
    pub url: String,
}

/// Props for the [`MaskGallery`] component.
#[derive(Props, Clone, PartialEq)]
pub struct MaskGalleryProps {
    /// Masks in palette order.
    masks: Vec<MaskPreview>,
}

/// Mask thumbnails labelled with their color.
#[component]
pub fn MaskGallery(props: MaskGalleryProps) -> Element {
    if props.masks.is_empty() {
        return rsx! {};
    }
    rsx! {
        section { class: "gallery",
            h3 { "Masks" }
            div { class: "gallery-grid",
                for mask in props.masks.iter() {
                    figure { key: "{mask.url}", class: "tile",
                        img { src: "{mask.url}", alt: "Mask for {mask.color}" }
                        figcaption {
                            span {
                                class: "swatch-chip small",
                                style: "background-color: {mask.color}",
                            }
                            "{mask.color}"
                        }
                    }
                }
            }
        }
    }
}
