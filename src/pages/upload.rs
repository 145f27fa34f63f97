//! X-ray upload and analysis page.
//!
//! Left card: drop zone, Analyze button and inline warnings. Right card,
//! once a result exists: the detection result and model metrics tabs.

use std::sync::Arc;

use leptos::prelude::*;
use tracing::{debug, error};
use wasm_bindgen_futures::spawn_local;

use crate::browser;
use crate::classifier::Classifier;
use crate::components::drop_zone::XrayDropZone;
use crate::components::result_panel::ResultPanel;
use crate::error::AnalysisError;
use crate::presentation::format_file_size;
use crate::workflow::{analyze, Intake, ResultTab, UploadWorkflow};

#[component]
pub fn UploadPage(classifier: Arc<dyn Classifier>) -> impl IntoView {
    let workflow = RwSignal::new(UploadWorkflow::new());

    let preview = Signal::derive(move || workflow.with(|w| w.preview_uri().map(str::to_string)));
    let file_summary = Signal::derive(move || {
        workflow.with(|w| {
            w.file()
                .filter(|_| !w.is_reading())
                .map(|f| format!("{} ({})", f.name, format_file_size(f.size())))
        })
    });
    let loading = Signal::derive(move || workflow.with(UploadWorkflow::is_loading));
    let reading = Signal::derive(move || workflow.with(UploadWorkflow::is_reading));
    let error = Signal::derive(move || workflow.with(|w| w.error_message().to_string()));
    let analysis = Memo::new(move |_| workflow.with(|w| w.analysis().cloned()));
    let tab = Memo::new(move |_| workflow.with(UploadWorkflow::tab));

    let on_file = Callback::new(move |file: web_sys::File| {
        let Some(ticket) = workflow.try_update(UploadWorkflow::begin_intake) else {
            return;
        };
        spawn_local(async move {
            match browser::load_selected_file(file).await {
                Ok(selected) => {
                    let preview_uri = selected.preview_uri.clone();
                    match workflow.try_update(|w| w.finish_intake(ticket, selected)) {
                        Some(Intake::Applied(Some(unused)) | Intake::Stale(unused)) => {
                            browser::revoke_preview_uri(&unused)
                        }
                        Some(Intake::Applied(None)) => {}
                        // Page is gone; nobody will show this preview.
                        None => browser::revoke_preview_uri(&preview_uri),
                    }
                }
                Err(e) => {
                    error!("Failed to read file: {}", e);
                    workflow.try_update(|w| w.fail_intake(ticket, &e));
                }
            }
        });
    });

    let on_tab = Callback::new(move |selected: ResultTab| {
        workflow.update(|w| w.set_tab(selected));
    });

    let on_analyze = move |_| {
        let classifier = classifier.clone();
        spawn_local(async move {
            match analyze(&workflow, classifier.as_ref()).await {
                Ok(_) => {}
                // Already surfaced through the workflow's error message or logged there.
                Err(
                    AnalysisError::Superseded
                    | AnalysisError::AlreadyRunning
                    | AnalysisError::ReadingFile
                    | AnalysisError::Detached,
                ) => {}
                Err(e) => debug!("analysis attempt ended: {}", e),
            }
        });
    };

    on_cleanup(move || {
        if let Some(Some(uri)) = workflow.try_with_untracked(|w| w.preview_uri().map(str::to_string)) {
            browser::revoke_preview_uri(&uri);
        }
    });

    view! {
        <div class="page dashboard-container">
            <style>{include_str!("upload.css")}</style>

            <div class="upload-results-row">
                <div class="upload-card">
                    <h2>"🩻 Upload Chest X-Ray"</h2>
                    <p class="page-description">"Upload a clear chest X-ray image for analysis"</p>

                    <XrayDropZone preview=preview reading=reading on_file=on_file />

                    {move || file_summary.get().map(|summary| view! {
                        <p class="file-summary">{summary}</p>
                    })}

                    <div class="button-row">
                        <button
                            class="btn btn-primary"
                            disabled=move || loading.get() || reading.get()
                            on:click=on_analyze
                        >
                            {move || if loading.get() { "Analyzing..." } else { "Analyze X-Ray" }}
                        </button>
                    </div>

                    {move || {
                        let message = error.get();
                        (!message.is_empty()).then(|| view! {
                            <p class="error-message">{message}</p>
                        })
                    }}
                </div>

                {move || analysis.get().map(|analysis| view! {
                    <ResultPanel analysis=analysis tab=tab on_tab=on_tab />
                })}
            </div>
        </div>
    }
}
