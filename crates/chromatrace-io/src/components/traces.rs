//! Gallery of traced SVGs with per-trace download and copy.

use std::rc::Rc;

use chromatrace_pipeline::Rgb;
use chromatrace_session::TraceResult;
use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdCopy, LdDownload};

use crate::{clipboard, download};

/// Props for the [`TraceGallery`] component.
#[derive(Props, Clone)]
pub struct TraceGalleryProps {
    /// Traces in job order. Shared so re-renders do not copy documents.
    traces: Rc<[TraceResult]>,
}

impl PartialEq for TraceGalleryProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.traces, &other.traces)
    }
}

/// Each trace rendered inline with download and copy buttons.
#[component]
pub fn TraceGallery(props: TraceGalleryProps) -> Element {
    if props.traces.is_empty() {
        return rsx! {};
    }
    rsx! {
        section { class: "gallery",
            h3 { "Traces" }
            div { class: "gallery-grid",
                for (i, trace) in props.traces.iter().enumerate() {
                    TraceTile { key: "{i}", trace: trace.clone() }
                }
            }
        }
    }
}

#[component]
fn TraceTile(trace: TraceResult) -> Element {
    let label = trace.color.map_or_else(|| "Monochrome".to_owned(), Rgb::to_hex);

    let on_download = {
        let svg = trace.svg.clone();
        move |_| {
            let _ = download::download_svg(&svg, &download::trace_filename(download::now_ms()));
        }
    };

    let on_copy = {
        let svg = trace.svg.clone();
        move |_| {
            let svg = svg.clone();
            spawn(async move {
                clipboard::copy_with_confirmation(&svg).await;
            });
        }
    };

    rsx! {
        figure { class: "tile",
            div { class: "svg-view", dangerous_inner_html: "{trace.svg}" }
            figcaption {
                span { "{label}" }
                button {
                    class: "icon-button",
                    title: "Download SVG",
                    onclick: on_download,
                    Icon { width: 16, height: 16, icon: LdDownload }
                }
                button {
                    class: "icon-button",
                    title: "Copy SVG",
                    onclick: on_copy,
                    Icon { width: 16, height: 16, icon: LdCopy }
                }
            }
        }
    }
}
