//! Blocking user notifications.

/// Show `message` in a blocking `window.alert` dialog.
///
/// Best-effort: a missing window or a rejected dialog is logged, not
/// reported.
pub fn alert(message: &str) {
    let result = web_sys::window()
        .ok_or_else(|| "no global window".to_owned())
        .and_then(|w| w.alert_with_message(message).map_err(|e| format!("{e:?}")));
    if let Err(e) = result {
        tracing::warn!(message, error = %e, "alert failed");
    }
}
