//! Drop zone for chest X-ray images.
//!
//! Click to open the file dialog or drag an image onto it. Shows the preview
//! of the current selection in place of the prompt.

use leptos::html::Input;
use leptos::prelude::*;

use crate::browser;

#[component]
pub fn XrayDropZone(
    /// Preview URI of the current selection
    #[prop(into)]
    preview: Signal<Option<String>>,
    /// True while the latest pick is being read
    #[prop(into)]
    reading: Signal<bool>,
    /// Called with the picked or dropped file, before it is read
    on_file: Callback<web_sys::File>,
) -> impl IntoView {
    let file_input = NodeRef::<Input>::new();
    let (is_over, set_is_over) = signal(false);

    let on_drop = move |ev: web_sys::DragEvent| {
        ev.prevent_default();
        set_is_over.set(false);

        if let Some(file) = browser::first_file(ev.data_transfer().and_then(|dt| dt.files())) {
            on_file.run(file);
        }
    };

    let on_input_change = move |ev: web_sys::Event| {
        let input: web_sys::HtmlInputElement = event_target(&ev);
        if let Some(file) = browser::first_file(input.files()) {
            on_file.run(file);
        }
        // Picking the same file again must fire another change event.
        input.set_value("");
    };

    let open_dialog = move |_| {
        if let Some(input) = file_input.get() {
            input.click();
        }
    };

    view! {
        <div
            class="custom-dropzone"
            class:dropzone-active=move || is_over.get()
            on:click=open_dialog
            on:dragover=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                set_is_over.set(true);
            }
            on:dragleave=move |_| set_is_over.set(false)
            on:drop=on_drop
        >
            {move || {
                if reading.get() {
                    view! {
                        <div class="dropzone-loading">
                            <div class="spinner"></div>
                            <p>"Reading image..."</p>
                        </div>
                    }.into_any()
                } else {
                    match preview.get() {
                        Some(src) => view! {
                            <img src=src class="preview-img" alt="Preview" />
                        }.into_any(),
                        None => view! {
                            <p class="dropzone-prompt">"📂 Click or Drop X-ray Here"</p>
                        }.into_any(),
                    }
                }
            }}
        </div>
        <input
            type="file"
            accept="image/*"
            style="display: none"
            node_ref=file_input
            on:change=on_input_change
        />
    }
}
