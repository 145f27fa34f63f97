//! Thin wrappers over the browser APIs the workflow needs.

use std::time::Duration;

use js_sys::{ArrayBuffer, Promise, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::model::SelectedFile;

/// Resolve after `duration` using `setTimeout`.
pub async fn sleep(duration: Duration) {
    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
    let promise = Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window().map(|window| {
            window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
        });
        if !matches!(scheduled, Some(Ok(_))) {
            // No timer available; resolve immediately rather than hang.
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// Read a picked or dropped file into a [`SelectedFile`] with a `blob:` preview URI.
pub async fn load_selected_file(file: web_sys::File) -> Result<SelectedFile, String> {
    let bytes = read_file_bytes(&file).await?;
    let preview_uri = web_sys::Url::create_object_url_with_blob(&file)
        .map_err(|e| format!("Failed to create preview: {:?}", e))?;

    Ok(SelectedFile::new(file.name(), file.type_(), bytes, preview_uri))
}

/// Release a preview URI created by [`load_selected_file`].
pub fn revoke_preview_uri(uri: &str) {
    if uri.starts_with("blob:") {
        let _ = web_sys::Url::revoke_object_url(uri);
    }
}

async fn read_file_bytes(file: &web_sys::File) -> Result<Vec<u8>, String> {
    let array_buffer: ArrayBuffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("Failed to read file: {:?}", e))?
        .dyn_into()
        .map_err(|_| "Failed to convert to ArrayBuffer")?;

    Ok(Uint8Array::new(&array_buffer).to_vec())
}

/// First file of a drop or picker selection, if any.
pub fn first_file(files: Option<web_sys::FileList>) -> Option<web_sys::File> {
    files.and_then(|list| list.get(0))
}

/// Best-effort text of a rejected JS promise.
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(exception) = value.dyn_ref::<web_sys::DomException>() {
        return format!("{}: {}", exception.name(), exception.message());
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| "Unknown error".to_string())
}

pub fn is_abort_error(value: &JsValue) -> bool {
    value
        .dyn_ref::<web_sys::DomException>()
        .map(|e| e.name() == "AbortError")
        .unwrap_or(false)
}
