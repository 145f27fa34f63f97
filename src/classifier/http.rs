//! Classifier backed by an HTTP classification service.
//!
//! Posts the image as `multipart/form-data` (field `file`) and decodes the
//! JSON answer with [`super::report::decode_response`]. The request is
//! aborted through an `AbortController` once the timeout elapses or the
//! request's cancellation trips.

use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use js_sys::{Array, Uint8Array};
use tracing::{debug, info, warn};
use url::Url;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::report::decode_response;
use super::{until_cancelled, CancellationToken, Classifier, ClassifyRequest};
use crate::browser;
use crate::error::ClassifierError;
use crate::model::{Analysis, SelectedFile};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often an outstanding request looks at its cancellation flag.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Multipart field the service reads the image from.
const FILE_FIELD: &str = "file";

pub struct HttpClassifier {
    endpoint: Url,
    timeout: Duration,
}

impl HttpClassifier {
    pub fn new(endpoint: Url, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// POST the image and return the status and body of the answer.
    ///
    /// The timeout covers the whole exchange, body included. Tripping the
    /// cancellation aborts the request.
    async fn post(
        &self,
        file: &SelectedFile,
        cancellation: &CancellationToken,
    ) -> Result<(u16, String), ClassifierError> {
        let window = web_sys::window()
            .ok_or_else(|| ClassifierError::Network("no window available".to_string()))?;

        let form = build_form(file).map_err(|e| ClassifierError::Network(browser::js_error_message(&e)))?;
        let controller = web_sys::AbortController::new()
            .map_err(|e| ClassifierError::Network(browser::js_error_message(&e)))?;

        let init = web_sys::RequestInit::new();
        init.set_method("POST");
        init.set_body(&form);
        init.set_signal(Some(&controller.signal()));

        let request = web_sys::Request::new_with_str_and_init(self.endpoint.as_str(), &init)
            .map_err(|e| ClassifierError::Network(browser::js_error_message(&e)))?;

        let timeout_controller = controller.clone();
        let abort = Closure::once(move || timeout_controller.abort());
        let timeout_ms = i32::try_from(self.timeout.as_millis()).unwrap_or(i32::MAX);
        let timer = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(abort.as_ref().unchecked_ref(), timeout_ms)
            .ok();

        let exchanged = until_cancelled(self.exchange(&window, &request), cancellation, || {
            browser::sleep(CANCEL_POLL_INTERVAL)
        })
        .await;

        if let Some(handle) = timer {
            window.clear_timeout_with_handle(handle);
        }
        drop(abort);

        match exchanged {
            Some(result) => result,
            None => {
                controller.abort();
                Err(ClassifierError::Cancelled)
            }
        }
    }

    async fn exchange(
        &self,
        window: &web_sys::Window,
        request: &web_sys::Request,
    ) -> Result<(u16, String), ClassifierError> {
        let response: web_sys::Response = JsFuture::from(window.fetch_with_request(request))
            .await
            .map_err(|e| self.transport_error(&e))?
            .dyn_into()
            .map_err(|_| ClassifierError::Malformed("fetch did not yield a Response".to_string()))?;

        let text = response
            .text()
            .map_err(|e| ClassifierError::Network(browser::js_error_message(&e)))?;
        let body = JsFuture::from(text)
            .await
            .map_err(|e| self.transport_error(&e))?
            .as_string()
            .unwrap_or_default();

        Ok((response.status(), body))
    }

    fn transport_error(&self, err: &JsValue) -> ClassifierError {
        transport_failure(browser::is_abort_error(err), browser::js_error_message(err), self.timeout)
    }
}

impl Classifier for HttpClassifier {
    fn describe(&self) -> String {
        format!(
            "Classification service at {} ({} s timeout)",
            self.endpoint,
            self.timeout.as_secs()
        )
    }

    fn classify(&self, request: ClassifyRequest) -> LocalBoxFuture<'_, Result<Analysis, ClassifierError>> {
        async move {
            info!(
                token = %request.token,
                file = %request.file.name,
                bytes = request.file.size(),
                endpoint = %self.endpoint,
                "posting image to classifier"
            );

            let (status, body) = match self.post(&request.file, &request.cancellation).await {
                Ok(answer) => answer,
                Err(ClassifierError::Cancelled) => {
                    debug!(token = %request.token, "classifier request aborted for new selection");
                    return Err(ClassifierError::Cancelled);
                }
                Err(e) => {
                    warn!(token = %request.token, error = %e, "classifier request failed");
                    return Err(e);
                }
            };

            if request.cancellation.is_cancelled() {
                debug!(token = %request.token, "dropping response for cancelled request");
                return Err(ClassifierError::Cancelled);
            }

            interpret_response(status, &body, &self.endpoint)
        }
        .boxed_local()
    }
}

/// Turn a finished exchange into the classifier's answer.
fn interpret_response(status: u16, body: &str, endpoint: &Url) -> Result<Analysis, ClassifierError> {
    if !(200..300).contains(&status) {
        return Err(ClassifierError::Server {
            status,
            message: summarize_body(body),
        });
    }
    decode_response(body, endpoint)
}

/// Classify a rejected `fetch` or body read. Aborts only come from the timer.
fn transport_failure(aborted: bool, message: String, timeout: Duration) -> ClassifierError {
    if aborted {
        ClassifierError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    } else {
        ClassifierError::Network(message)
    }
}

fn build_form(file: &SelectedFile) -> Result<web_sys::FormData, JsValue> {
    let bytes = Uint8Array::from(&file.bytes[..]);
    let parts = Array::of1(&bytes);

    let options = web_sys::BlobPropertyBag::new();
    if !file.content_type.is_empty() {
        options.set_type(&file.content_type);
    }
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

    let form = web_sys::FormData::new()?;
    form.append_with_blob_and_filename(FILE_FIELD, &blob, &file.name)?;
    Ok(form)
}

/// Keep server error bodies short enough for an inline message.
fn summarize_body(body: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response".to_string();
    }
    match trimmed.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_body_truncates_long_pages() {
        let page = "x".repeat(500);
        let summary = summarize_body(&page);
        assert_eq!(summary.len(), 203);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_summarize_body_handles_empty_and_short() {
        assert_eq!(summarize_body("  \n"), "empty response");
        assert_eq!(summarize_body(" model not loaded "), "model not loaded");
    }

    fn endpoint() -> Url {
        Url::parse("http://localhost:5000/api/classify").unwrap()
    }

    const ANSWER: &str = r#"{
        "prediction": "NORMAL",
        "accuracy": 0.93,
        "report": {
            "NORMAL": {"precision": 0.94, "recall": 0.96, "f1-score": 0.95, "support": 220},
            "PNEUMONIA": {"precision": 0.89, "recall": 0.91, "f1-score": 0.90, "support": 180},
            "macro avg": {"precision": 0.91, "recall": 0.93, "f1-score": 0.92, "support": 400},
            "weighted avg": {"precision": 0.92, "recall": 0.93, "f1-score": 0.93, "support": 400}
        },
        "cm_path": "/static/cm.png"
    }"#;

    #[test]
    fn test_success_status_decodes_body() {
        let analysis = interpret_response(200, ANSWER, &endpoint()).unwrap();
        assert_eq!(analysis.prediction.label, crate::model::PredictionLabel::Normal);
        assert_eq!(analysis.metrics.confusion_matrix_url, "http://localhost:5000/static/cm.png");
    }

    #[test]
    fn test_error_status_is_server_error() {
        let err = interpret_response(503, "  model not loaded\n", &endpoint()).unwrap_err();
        assert_eq!(
            err,
            ClassifierError::Server {
                status: 503,
                message: "model not loaded".to_string(),
            }
        );

        // A valid body does not rescue a failing status.
        let err = interpret_response(404, ANSWER, &endpoint()).unwrap_err();
        assert!(matches!(err, ClassifierError::Server { status: 404, .. }), "got {:?}", err);
    }

    #[test]
    fn test_undecodable_success_body_is_malformed() {
        let err = interpret_response(200, "<html>proxy error</html>", &endpoint()).unwrap_err();
        assert!(matches!(err, ClassifierError::Malformed(_)), "got {:?}", err);
    }

    #[test]
    fn test_abort_maps_to_timeout_and_other_failures_to_network() {
        let timeout = Duration::from_secs(30);
        assert_eq!(
            transport_failure(true, "AbortError: signal is aborted".to_string(), timeout),
            ClassifierError::Timeout(30_000)
        );
        assert_eq!(
            transport_failure(false, "TypeError: Failed to fetch".to_string(), timeout),
            ClassifierError::Network("TypeError: Failed to fetch".to_string())
        );
    }

    #[test]
    fn test_describe_mentions_endpoint() {
        let classifier = HttpClassifier::new(
            Url::parse("http://localhost:5000/api/classify").unwrap(),
            Duration::from_secs(15),
        );
        let text = classifier.describe();
        assert!(text.contains("http://localhost:5000/api/classify"), "{}", text);
        assert!(text.contains("15 s"), "{}", text);
    }
}
