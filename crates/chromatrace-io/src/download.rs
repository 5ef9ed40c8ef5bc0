//! File download via Blob URLs.
//!
//! Dioxus has no built-in file download API. Downloads are triggered by
//! creating a `Blob`, generating an object URL and clicking a temporary
//! `<a download>` element.
//!
//! [`trigger_download`] requires a browser environment; the filename
//! helpers are plain functions.

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::BlobPropertyBag;

/// MIME type of every exported document.
pub const SVG_MIME: &str = "image/svg+xml";

/// Filename of the merged document.
pub const MERGED_FILENAME: &str = "generated_image.svg";

/// Errors that can occur when triggering a file download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Filename for a single trace downloaded at `timestamp_ms`.
///
/// ```
/// assert_eq!(chromatrace_io::download::trace_filename(1_700_000_000_000), "svg-1700000000000.svg");
/// ```
#[must_use]
pub fn trace_filename(timestamp_ms: u64) -> String {
    format!("svg-{timestamp_ms}.svg")
}

/// Milliseconds since the Unix epoch, from the browser clock.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn now_ms() -> u64 {
    js_sys::Date::now().max(0.0) as u64
}

/// Trigger a browser download of `data` as `filename`.
///
/// The object URL is revoked after the click.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if any browser API call fails.
pub fn trigger_download(data: &str, filename: &str, mime_type: &str) -> Result<(), DownloadError> {
    let window =
        web_sys::window().ok_or_else(|| DownloadError::JsError("no global window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| DownloadError::JsError("no document".into()))?;

    let parts = js_sys::Array::new();
    parts.push(&JsValue::from_str(data));
    let opts = BlobPropertyBag::new();
    opts.set_type(mime_type);
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &opts)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|e| DownloadError::JsError(format!("failed to cast element: {e:?}")))?;
    anchor.set_href(&url);
    anchor.set_download(filename);

    let body = document
        .body()
        .ok_or_else(|| DownloadError::JsError("no document body".into()))?;
    body.append_child(&anchor)?;
    anchor.click();

    // The download has started; cleanup failures are not download failures.
    let _ = body.remove_child(&anchor);
    let _ = web_sys::Url::revoke_object_url(&url);

    tracing::debug!(filename, bytes = data.len(), "download triggered");
    Ok(())
}

/// Download an SVG document, logging and returning any failure.
///
/// # Errors
///
/// See [`trigger_download`].
pub fn download_svg(svg: &str, filename: &str) -> Result<(), DownloadError> {
    trigger_download(svg, filename, SVG_MIME).inspect_err(|e| {
        tracing::error!(filename, error = %e, "download failed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_filename_embeds_timestamp() {
        assert_eq!(trace_filename(0), "svg-0.svg");
        assert_eq!(trace_filename(1_712_345_678_901), "svg-1712345678901.svg");
    }

    #[test]
    fn merged_filename_is_fixed() {
        assert_eq!(MERGED_FILENAME, "generated_image.svg");
        assert_eq!(SVG_MIME, "image/svg+xml");
    }
}
