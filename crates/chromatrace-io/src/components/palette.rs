//! Swatch strip for the extracted palette.

use chromatrace_pipeline::Rgb;
use dioxus::prelude::*;

/// Props for the [`PaletteStrip`] component.
#[derive(Props, Clone, PartialEq)]
pub struct PaletteStripProps {
    /// Palette colors, most significant first.
    colors: Vec<Rgb>,
}

/// One swatch per palette color, labelled with its hex code.
#[component]
pub fn PaletteStrip(props: PaletteStripProps) -> Element {
    rsx! {
        div { class: "palette",
            for (i, color) in props.colors.iter().enumerate() {
                div { key: "{i}", class: "swatch",
                    div {
                        class: "swatch-chip",
                        style: "background-color: {color}",
                        title: "{color}",
                    }
                    span { class: "swatch-label", "{color}" }
                }
            }
        }
    }
}
