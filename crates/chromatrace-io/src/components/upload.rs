//! File upload component with drag-and-drop and file picker.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;

use crate::notify;

/// Extensions the decoder understands.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "gif"];

/// Shown when the selected file is not an image.
pub const INVALID_IMAGE_MESSAGE: &str = "Please select a valid image";

/// Whether `name` looks like an image file.
fn is_image_file(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Called with the raw file bytes and filename of a chosen image.
    on_upload: EventHandler<(Vec<u8>, String)>,
    /// Disables the picker while work is in flight.
    #[props(default)]
    disabled: bool,
}

/// A drop zone with an `image/*` file picker.
///
/// Non-image files are rejected with a blocking alert and never reach
/// `on_upload`.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);

    let process_files = move |files: Vec<FileData>| async move {
        let Some(file) = files.first() else {
            return;
        };
        let name = file.name();
        if !is_image_file(&name) {
            tracing::warn!(name = %name, "rejected non-image upload");
            notify::alert(INVALID_IMAGE_MESSAGE);
            return;
        }
        match file.read_bytes().await {
            Ok(bytes) => {
                error.set(None);
                props.on_upload.call((bytes.to_vec(), name));
            }
            Err(e) => error.set(Some(format!("Failed to read file: {e}"))),
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        process_files(evt.files()).await;
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        process_files(evt.files()).await;
    };

    let zone_class = if dragging() { "upload dragging" } else { "upload" };

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| dragging.set(false),
            ondrop: handle_drop,

            if let Some(ref err) = error() {
                p { class: "error-text", "{err}" }
            }

            label { class: "button",
                input {
                    r#type: "file",
                    accept: "image/*",
                    class: "hidden",
                    disabled: props.disabled,
                    onchange: handle_files,
                }
                "Choose Image"
            }
            p { class: "muted", "or drop one here" }
        }
    }
}
