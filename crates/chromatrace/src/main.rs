use std::rc::Rc;

use chromatrace_io::raster::{revoke_blob_url, rgba_image_to_blob_url};
use chromatrace_io::{
    FileUpload, INVALID_IMAGE_MESSAGE, MaskGallery, MaskPreview, MergedPreview, PaletteStrip,
    TraceGallery, notify,
};
use chromatrace_session::{
    Mode, OutlineTracer, Phase, Session, SessionError, Step, TraceResult,
};
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

fn main() {
    dioxus::launch(app);
}

/// Copy any masks and traces the session produced since the last sync
/// into the render signals.
///
/// `synced` counts session masks already handled, previewed or not, so a
/// mask whose preview failed is skipped rather than retried.
fn sync_results(
    session: Signal<Session>,
    mut synced: Signal<usize>,
    mut masks: Signal<Vec<MaskPreview>>,
    mut traces: Signal<Rc<[TraceResult]>>,
) {
    let session = session.read();
    let mut cursor = *synced.peek();
    let fresh = preview_new(session.masks(), &mut cursor, |mask| {
        match rgba_image_to_blob_url(&mask.image) {
            Ok(url) => Some(MaskPreview {
                color: mask.color,
                url,
            }),
            Err(e) => {
                tracing::warn!(color = %mask.color, error = %e, "mask preview failed");
                None
            }
        }
    });
    synced.set(cursor);
    masks.write().extend(fresh);
    if traces.peek().len() != session.traces().len() {
        traces.set(Rc::from(session.traces()));
    }
}

/// Run `preview` over the items past `cursor` and advance the cursor
/// past all of them, including those whose preview returned `None`.
fn preview_new<T, P>(
    items: &[T],
    cursor: &mut usize,
    preview: impl FnMut(&T) -> Option<P>,
) -> Vec<P> {
    let fresh = items.get(*cursor..).unwrap_or_default();
    *cursor = items.len().max(*cursor);
    fresh.iter().filter_map(preview).collect()
}

fn revoke_all(mut synced: Signal<usize>, mut masks: Signal<Vec<MaskPreview>>) {
    for mask in masks.write().drain(..) {
        revoke_blob_url(&mask.url);
    }
    synced.set(0);
}

/// Root application component.
///
/// Owns the [`Session`] and mirrors its results into signals. Long work
/// runs in spawned tasks that yield to the event loop before every
/// synchronous step, so the "Processing..." state and per-color progress
/// get painted.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    // --- Application state ---
    let mut session = use_signal(Session::default);
    let mut source_url = use_signal(|| Option::<String>::None);
    let mask_previews = use_signal(Vec::<MaskPreview>::new);
    let synced_masks = use_signal(|| 0_usize);
    let mut traces = use_signal(|| Rc::<[TraceResult]>::from(Vec::new()));
    let mut merged = use_signal(|| Option::<String>::None);
    let mut error = use_signal(|| Option::<String>::None);

    let mut clear_outputs = move || {
        revoke_all(synced_masks, mask_previews);
        traces.set(Rc::from(Vec::new()));
        merged.set(None);
        error.set(None);
    };

    let mut clear_source = move || {
        if let Some(url) = source_url.write().take() {
            revoke_blob_url(&url);
        }
    };

    // --- File upload handler ---
    let on_upload = move |(bytes, name): (Vec<u8>, String)| {
        clear_outputs();
        clear_source();
        let token = session.write().begin_load();

        spawn(async move {
            // Let the "Extracting colors..." state paint before decoding.
            TimeoutFuture::new(0).await;

            let loaded = session.write().finish_load(token, &bytes, &name);
            match loaded {
                Ok(()) => {
                    let url = session.read().image().map(rgba_image_to_blob_url);
                    match url {
                        Some(Ok(url)) => source_url.set(Some(url)),
                        Some(Err(e)) => tracing::warn!(error = %e, "source preview failed"),
                        None => {}
                    }
                }
                // A newer upload or a reset owns the session now.
                Err(SessionError::Stale) => {}
                Err(e) => error.set(Some(e.to_string())),
            }
        });
    };

    // --- Generation handler ---
    let mut generate = move |mode: Mode| {
        clear_outputs();
        let started = session.write().start(mode);
        let generation = match started {
            Ok(generation) => generation,
            Err(SessionError::NoImage) => {
                notify::alert(INVALID_IMAGE_MESSAGE);
                return;
            }
            Err(e) => {
                error.set(Some(e.to_string()));
                return;
            }
        };
        let tracer = OutlineTracer::from_config(session.peek().config());

        spawn(async move {
            loop {
                // Yield so the previous color's results render before the
                // next synchronous mask + trace.
                TimeoutFuture::new(0).await;

                let step = session.write().step(generation, &tracer);
                match step {
                    Step::Progress { .. } => {
                        sync_results(session, synced_masks, mask_previews, traces);
                    }
                    Step::Finished | Step::Failed(_) => {
                        sync_results(session, synced_masks, mask_previews, traces);
                        // A failed color only lacks its own layer; the
                        // other traces still merge.
                        if !session.read().traces().is_empty() {
                            let joined = session.read().merged_svg();
                            match joined {
                                Ok(svg) => merged.set(Some(svg)),
                                Err(e) => error.set(Some(e.to_string())),
                            }
                        }
                        if let Step::Failed(e) = step {
                            error.set(Some(e.to_string()));
                        }
                        break;
                    }
                    // Superseded by a reset or a newer run; its results
                    // were never written.
                    Step::Stale => break,
                }
            }
        });
    };

    // --- Remove handler ---
    let on_remove = move |_| {
        session.write().reset();
        clear_outputs();
        clear_source();
    };

    // --- Derived view state ---
    let phase = session.read().phase().clone();
    let busy = phase.is_busy();
    let has_image = session.read().image().is_some();
    let palette = session.read().palette().to_vec();
    let status = match (&phase, session.read().progress()) {
        (Phase::ColorExtracting, _) => Some("Extracting colors...".to_owned()),
        (Phase::MaskBuilding | Phase::Tracing, Some((done, total))) => {
            Some(format!("Processing... {done}/{total}"))
        }
        _ => None,
    };
    let generate_label = if busy { "Processing..." } else { "Generate SVG" };
    let generate_color_label = if busy {
        "Processing..."
    } else {
        "Generate Color SVG"
    };

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: include_str!("../assets/style.css") }

        header {
            h1 { "chromatrace" }
            p { class: "muted", "Trace an image into one SVG layer per dominant color" }
        }

        main {
            FileUpload { on_upload: on_upload, disabled: busy }

            if let Some(ref url) = source_url() {
                div { class: "source",
                    img { src: "{url}", alt: "Uploaded image" }
                }
            }

            if !palette.is_empty() {
                PaletteStrip { colors: palette }
            }

            div { class: "actions",
                button {
                    class: "button",
                    disabled: busy,
                    onclick: move |_| generate(Mode::Monochrome),
                    "{generate_label}"
                }
                button {
                    class: "button",
                    disabled: busy,
                    onclick: move |_| generate(Mode::Color),
                    "{generate_color_label}"
                }
                if has_image {
                    button {
                        class: "button secondary",
                        onclick: on_remove,
                        "Remove"
                    }
                }
                if let Some(ref status) = status {
                    span { class: "status", "{status}" }
                }
            }

            if let Some(ref err) = error() {
                div { class: "error-panel", "{err}" }
            }

            MaskGallery { masks: mask_previews() }
            TraceGallery { traces: traces() }

            if let Some(svg) = merged() {
                MergedPreview { svg: svg }
            }
        }
    }
}
