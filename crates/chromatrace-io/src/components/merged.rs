//! Merged document preview with download.

use dioxus::prelude::*;

use crate::download;

/// Props for the [`MergedPreview`] component.
#[derive(Props, Clone, PartialEq)]
pub struct MergedPreviewProps {
    /// The merged document.
    svg: String,
}

/// The merged SVG rendered inline, with a "Download SVG" button.
#[component]
pub fn MergedPreview(props: MergedPreviewProps) -> Element {
    let mut export_error = use_signal(|| Option::<String>::None);

    let on_download = {
        let svg = props.svg.clone();
        move |_| match download::download_svg(&svg, download::MERGED_FILENAME) {
            Ok(()) => export_error.set(None),
            Err(e) => export_error.set(Some(format!("Download failed: {e}"))),
        }
    };

    rsx! {
        section { class: "merged",
            h3 { "Merged" }
            div { class: "svg-view", dangerous_inner_html: "{props.svg}" }
            if let Some(ref err) = export_error() {
                p { class: "error-text", "{err}" }
            }
            button { class: "button", onclick: on_download, "Download SVG" }
        }
    }
}
