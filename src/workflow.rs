//! The upload → analyze → display workflow as a state machine.
//!
//! `UploadWorkflow` owns all view state. The page keeps it in an
//! `RwSignal`, tests keep it in a `RefCell`; both reach it through
//! [`WorkflowStore`], so [`analyze`] is the same code in either place.
//!
//! ```text
//! Idle ──select──▶ FileSelected ──analyze──▶ Analyzing ──▶ ResultsShown
//!                        ▲                       │    └──▶ ErrorShown
//!                        └──────── select ───────┴─────────────┘
//! ```

use std::cell::RefCell;

use leptos::prelude::{RwSignal, Update};
use tracing::{debug, info, warn};

use crate::classifier::{CancellationToken, Classifier, ClassifyRequest, RequestToken};
use crate::error::{AnalysisError, ClassifierError};
use crate::model::{Analysis, MetricsReport, PredictionResult, SelectedFile};

pub const MISSING_FILE_MESSAGE: &str = "⚠️ Please upload an image!";

/// Mutually exclusive views of the result panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultTab {
    #[default]
    Results,
    Metrics,
}

/// Coarse state derived from the workflow's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    FileSelected,
    Analyzing,
    ResultsShown,
    ErrorShown,
}

/// Whether a classifier answer was applied to the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// Identifies one file read started by a pick or drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct IntakeTicket(u64);

/// What became of a finished file read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intake {
    /// The file is now selected. Holds the preview URI it replaced.
    Applied(Option<String>),
    /// A newer pick took over. Holds the read file's own preview URI.
    Stale(String),
}

#[derive(Debug, Clone)]
struct InFlight {
    token: RequestToken,
    cancellation: CancellationToken,
}

#[derive(Debug, Clone, Default)]
pub struct UploadWorkflow {
    file: Option<SelectedFile>,
    analysis: Option<Analysis>,
    tab: ResultTab,
    error: String,
    last_token: RequestToken,
    in_flight: Option<InFlight>,
    last_intake: IntakeTicket,
    pending_intake: Option<IntakeTicket>,
}

impl UploadWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selected file and reset everything derived from the old one.
    ///
    /// Any analysis still running is cancelled and its answer will be
    /// discarded. Returns the replaced file's preview URI for cleanup.
    pub fn select_file(&mut self, file: SelectedFile) -> Option<String> {
        self.reset_for_selection();
        self.pending_intake = None;

        info!(file = %file.name, bytes = file.size(), content_type = %file.content_type, "file selected");
        self.file.replace(file).map(|old| old.preview_uri)
    }

    /// Start reading a freshly picked file.
    ///
    /// Resets results right away, before any bytes are read. Only the read
    /// holding the returned ticket may complete the selection.
    pub fn begin_intake(&mut self) -> IntakeTicket {
        self.reset_for_selection();
        self.last_intake = IntakeTicket(self.last_intake.0 + 1);
        self.pending_intake = Some(self.last_intake);
        debug!(ticket = self.last_intake.0, "reading picked file");
        self.last_intake
    }

    /// Complete the read started by [`Self::begin_intake`].
    pub fn finish_intake(&mut self, ticket: IntakeTicket, file: SelectedFile) -> Intake {
        if self.pending_intake != Some(ticket) {
            debug!(ticket = ticket.0, file = %file.name, "discarding superseded file read");
            return Intake::Stale(file.preview_uri);
        }
        Intake::Applied(self.select_file(file))
    }

    /// Record that the read holding `ticket` failed.
    pub fn fail_intake(&mut self, ticket: IntakeTicket, reason: &str) {
        if self.pending_intake != Some(ticket) {
            debug!(ticket = ticket.0, "ignoring failure of superseded file read");
            return;
        }
        warn!(ticket = ticket.0, reason, "could not read picked file");
        self.pending_intake = None;
        self.error = format!("❌ Could not read image: {}", reason);
    }

    fn reset_for_selection(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancellation.cancel();
            debug!(token = %in_flight.token, "abandoning analysis for new selection");
        }
        self.analysis = None;
        self.tab = ResultTab::Results;
        self.error.clear();
    }

    /// Validate preconditions and enter the analyzing state.
    ///
    /// Without a file this records [`MISSING_FILE_MESSAGE`] and fails; the
    /// loading flag is left untouched.
    pub fn begin_analysis(&mut self) -> Result<ClassifyRequest, AnalysisError> {
        if self.in_flight.is_some() {
            return Err(AnalysisError::AlreadyRunning);
        }
        if self.pending_intake.is_some() {
            return Err(AnalysisError::ReadingFile);
        }
        let Some(file) = self.file.clone() else {
            warn!("analysis requested without a file");
            self.error = MISSING_FILE_MESSAGE.to_string();
            return Err(AnalysisError::MissingFile);
        };

        self.last_token = self.last_token.next();
        let cancellation = CancellationToken::new();
        self.in_flight = Some(InFlight {
            token: self.last_token,
            cancellation: cancellation.clone(),
        });
        self.error.clear();
        self.analysis = None;

        Ok(ClassifyRequest {
            token: self.last_token,
            file,
            cancellation,
        })
    }

    /// Apply a classifier answer if it belongs to the analysis in flight.
    ///
    /// Failures clear any previous prediction and metrics.
    pub fn complete(&mut self, token: RequestToken, outcome: Result<Analysis, ClassifierError>) -> Completion {
        match &self.in_flight {
            Some(in_flight) if in_flight.token == token => {}
            _ => {
                debug!(%token, latest = %self.last_token, "discarding stale classifier answer");
                return Completion::Stale;
            }
        }
        self.in_flight = None;

        match outcome {
            Ok(analysis) => {
                info!(%token, label = %analysis.prediction.label, "analysis complete");
                self.analysis = Some(analysis);
                self.tab = ResultTab::Results;
                self.error.clear();
            }
            Err(err) => {
                warn!(%token, error = %err, "analysis failed");
                self.analysis = None;
                self.error = failure_message(&err);
            }
        }
        Completion::Applied
    }

    /// Switch the result panel's tab. Never touches results.
    pub fn set_tab(&mut self, tab: ResultTab) {
        self.tab = tab;
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn preview_uri(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.preview_uri.as_str())
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.analysis.as_ref().map(|a| &a.prediction)
    }

    pub fn metrics(&self) -> Option<&MetricsReport> {
        self.analysis.as_ref().map(|a| &a.metrics)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// A picked file is still being read.
    pub fn is_reading(&self) -> bool {
        self.pending_intake.is_some()
    }

    pub fn tab(&self) -> ResultTab {
        self.tab
    }

    /// Current error text; empty when there is none.
    pub fn error_message(&self) -> &str {
        &self.error
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading() {
            Phase::Analyzing
        } else if self.analysis.is_some() {
            Phase::ResultsShown
        } else if !self.error.is_empty() {
            Phase::ErrorShown
        } else if self.file.is_some() || self.is_reading() {
            Phase::FileSelected
        } else {
            Phase::Idle
        }
    }
}

pub fn failure_message(err: &ClassifierError) -> String {
    format!("❌ Analysis failed: {}", err)
}

/// Somewhere an [`UploadWorkflow`] lives.
///
/// Returns `None` when the owner is gone (e.g. a disposed signal).
pub trait WorkflowStore {
    fn update_workflow<R>(&self, f: impl FnOnce(&mut UploadWorkflow) -> R) -> Option<R>;
}

impl WorkflowStore for RwSignal<UploadWorkflow> {
    fn update_workflow<R>(&self, f: impl FnOnce(&mut UploadWorkflow) -> R) -> Option<R> {
        self.try_update(f)
    }
}

impl WorkflowStore for RefCell<UploadWorkflow> {
    fn update_workflow<R>(&self, f: impl FnOnce(&mut UploadWorkflow) -> R) -> Option<R> {
        Some(f(&mut self.borrow_mut()))
    }
}

/// Run one analysis of the currently selected file.
///
/// State is only borrowed around the suspension point, so a new selection
/// can land while the classifier works; its answer is then discarded.
pub async fn analyze<S>(store: &S, classifier: &dyn Classifier) -> Result<Analysis, AnalysisError>
where
    S: WorkflowStore,
{
    let request = store
        .update_workflow(UploadWorkflow::begin_analysis)
        .ok_or(AnalysisError::Detached)??;
    let token = request.token;
    info!(%token, file = %request.file.name, "analysis started");

    let outcome = classifier.classify(request).await;

    let completion = store
        .update_workflow(|w| w.complete(token, outcome.clone()))
        .ok_or(AnalysisError::Detached)?;

    match completion {
        Completion::Stale => Err(AnalysisError::Superseded),
        Completion::Applied => outcome.map_err(AnalysisError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::simulated::reference_metrics;
    use crate::model::PredictionLabel;

    fn file(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/png", vec![1u8, 2, 3], format!("blob:{}", name))
    }

    fn analysis(label: PredictionLabel) -> Analysis {
        Analysis {
            prediction: PredictionResult::new(label),
            metrics: reference_metrics(),
        }
    }

    #[test]
    fn test_new_workflow_is_idle() {
        let workflow = UploadWorkflow::new();
        assert_eq!(workflow.phase(), Phase::Idle);
        assert!(!workflow.is_loading());
        assert_eq!(workflow.tab(), ResultTab::Results);
        assert_eq!(workflow.error_message(), "");
    }

    #[test]
    fn test_missing_file_sets_warning_without_loading() {
        let mut workflow = UploadWorkflow::new();
        let err = workflow.begin_analysis().unwrap_err();
        assert_eq!(err, AnalysisError::MissingFile);
        assert_eq!(workflow.error_message(), MISSING_FILE_MESSAGE);
        assert!(!workflow.is_loading());
        assert_eq!(workflow.phase(), Phase::ErrorShown);
    }

    #[test]
    fn test_selection_returns_previous_preview() {
        let mut workflow = UploadWorkflow::new();
        assert_eq!(workflow.select_file(file("a.png")), None);
        assert_eq!(workflow.select_file(file("b.png")), Some("blob:a.png".to_string()));
        assert_eq!(workflow.preview_uri(), Some("blob:b.png"));
        assert_eq!(workflow.phase(), Phase::FileSelected);
    }

    #[test]
    fn test_begin_analysis_enters_loading_and_clears_error() {
        let mut workflow = UploadWorkflow::new();
        let _ = workflow.begin_analysis();
        workflow.select_file(file("a.png"));
        let request = workflow.begin_analysis().unwrap();

        assert_eq!(request.token, RequestToken(1));
        assert_eq!(request.file.name, "a.png");
        assert!(workflow.is_loading());
        assert_eq!(workflow.error_message(), "");
        assert_eq!(workflow.phase(), Phase::Analyzing);
    }

    #[test]
    fn test_second_begin_while_loading_is_rejected() {
        let mut workflow = UploadWorkflow::new();
        workflow.select_file(file("a.png"));
        let first = workflow.begin_analysis().unwrap();
        assert_eq!(workflow.begin_analysis().unwrap_err(), AnalysisError::AlreadyRunning);

        assert_eq!(
            workflow.complete(first.token, Ok(analysis(PredictionLabel::Normal))),
            Completion::Applied
        );
    }

    #[test]
    fn test_success_populates_prediction_and_metrics_together() {
        let mut workflow = UploadWorkflow::new();
        workflow.select_file(file("a.png"));
        let request = workflow.begin_analysis().unwrap();
        workflow.set_tab(ResultTab::Metrics);

        workflow.complete(request.token, Ok(analysis(PredictionLabel::PneumoniaDetected)));

        assert!(workflow.prediction().is_some());
        assert!(workflow.metrics().is_some());
        assert_eq!(workflow.tab(), ResultTab::Results);
        assert!(!workflow.is_loading());
        assert_eq!(workflow.phase(), Phase::ResultsShown);
    }

    #[test]
    fn test_failure_clears_previous_results() {
        let mut workflow = UploadWorkflow::new();
        workflow.select_file(file("a.png"));
        let first = workflow.begin_analysis().unwrap();
        workflow.complete(first.token, Ok(analysis(PredictionLabel::Normal)));

        let second = workflow.begin_analysis().unwrap();
        let err = ClassifierError::Server {
            status: 500,
            message: "model not loaded".to_string(),
        };
        workflow.complete(second.token, Err(err.clone()));

        assert!(workflow.prediction().is_none());
        assert!(workflow.metrics().is_none());
        assert!(!workflow.is_loading());
        assert_eq!(workflow.error_message(), failure_message(&err));
        assert_eq!(workflow.phase(), Phase::ErrorShown);
    }

    #[test]
    fn test_selection_clears_results_and_cancels_in_flight() {
        let mut workflow = UploadWorkflow::new();
        workflow.select_file(file("a.png"));
        let first = workflow.begin_analysis().unwrap();
        workflow.complete(first.token, Ok(analysis(PredictionLabel::Normal)));
        workflow.set_tab(ResultTab::Metrics);

        let second = workflow.begin_analysis().unwrap();
        workflow.select_file(file("b.png"));

        assert!(second.cancellation.is_cancelled());
        assert!(workflow.analysis().is_none());
        assert!(!workflow.is_loading());
        assert_eq!(workflow.tab(), ResultTab::Results);

        assert_eq!(
            workflow.complete(second.token, Ok(analysis(PredictionLabel::PneumoniaDetected))),
            Completion::Stale
        );
        assert!(workflow.analysis().is_none());
        assert_eq!(workflow.phase(), Phase::FileSelected);
    }

    #[test]
    fn test_tab_switch_leaves_results_alone() {
        let mut workflow = UploadWorkflow::new();
        workflow.select_file(file("a.png"));
        let request = workflow.begin_analysis().unwrap();
        workflow.complete(request.token, Ok(analysis(PredictionLabel::Normal)));
        let before = workflow.analysis().cloned();

        workflow.set_tab(ResultTab::Metrics);
        workflow.set_tab(ResultTab::Results);
        workflow.set_tab(ResultTab::Metrics);

        assert_eq!(workflow.analysis().cloned(), before);
        assert_eq!(workflow.tab(), ResultTab::Metrics);
    }

    #[test]
    fn test_tokens_increase_across_attempts() {
        let mut workflow = UploadWorkflow::new();
        workflow.select_file(file("a.png"));
        let first = workflow.begin_analysis().unwrap();
        workflow.complete(first.token, Err(ClassifierError::Timeout(30_000)));
        let second = workflow.begin_analysis().unwrap();
        assert!(second.token > first.token);
    }

    #[test]
    fn test_pick_clears_results_before_bytes_arrive() {
        let mut workflow = UploadWorkflow::new();
        workflow.select_file(file("a.png"));
        let request = workflow.begin_analysis().unwrap();
        workflow.complete(request.token, Ok(analysis(PredictionLabel::PneumoniaDetected)));
        workflow.set_tab(ResultTab::Metrics);

        let ticket = workflow.begin_intake();

        assert!(workflow.prediction().is_none());
        assert!(workflow.metrics().is_none());
        assert_eq!(workflow.tab(), ResultTab::Results);
        assert!(workflow.is_reading());
        assert_eq!(workflow.phase(), Phase::FileSelected);
        assert_eq!(workflow.begin_analysis().unwrap_err(), AnalysisError::ReadingFile);

        assert_eq!(
            workflow.finish_intake(ticket, file("b.png")),
            Intake::Applied(Some("blob:a.png".to_string()))
        );
        assert!(!workflow.is_reading());
        assert_eq!(workflow.file().map(|f| f.name.as_str()), Some("b.png"));
        assert_eq!(workflow.begin_analysis().unwrap().file.name, "b.png");
    }

    #[test]
    fn test_pick_cancels_running_analysis() {
        let mut workflow = UploadWorkflow::new();
        workflow.select_file(file("a.png"));
        let request = workflow.begin_analysis().unwrap();

        workflow.begin_intake();

        assert!(request.cancellation.is_cancelled());
        assert!(!workflow.is_loading());
        assert_eq!(
            workflow.complete(request.token, Ok(analysis(PredictionLabel::Normal))),
            Completion::Stale
        );
        assert!(workflow.analysis().is_none());
    }

    #[test]
    fn test_out_of_order_reads_keep_latest_pick() {
        let mut workflow = UploadWorkflow::new();
        let first = workflow.begin_intake();
        let second = workflow.begin_intake();
        assert!(second > first);

        assert_eq!(workflow.finish_intake(second, file("b.png")), Intake::Applied(None));
        assert_eq!(
            workflow.finish_intake(first, file("a.png")),
            Intake::Stale("blob:a.png".to_string())
        );
        assert_eq!(workflow.preview_uri(), Some("blob:b.png"));
        assert!(!workflow.is_reading());
    }

    #[test]
    fn test_earlier_read_finishing_first_keeps_reading_state() {
        let mut workflow = UploadWorkflow::new();
        let first = workflow.begin_intake();
        let second = workflow.begin_intake();

        assert_eq!(
            workflow.finish_intake(first, file("a.png")),
            Intake::Stale("blob:a.png".to_string())
        );
        assert!(workflow.is_reading());
        assert!(workflow.file().is_none());

        assert_eq!(workflow.finish_intake(second, file("b.png")), Intake::Applied(None));
        assert_eq!(workflow.phase(), Phase::FileSelected);
    }

    #[test]
    fn test_failed_read_reports_error_only_for_latest_pick() {
        let mut workflow = UploadWorkflow::new();
        let first = workflow.begin_intake();
        let second = workflow.begin_intake();

        workflow.fail_intake(first, "NotReadableError");
        assert!(workflow.is_reading());
        assert_eq!(workflow.error_message(), "");

        workflow.fail_intake(second, "NotReadableError");
        assert!(!workflow.is_reading());
        assert_eq!(workflow.error_message(), "❌ Could not read image: NotReadableError");
        assert_eq!(workflow.phase(), Phase::ErrorShown);
    }

    #[test]
    fn test_direct_selection_supersedes_pending_read() {
        let mut workflow = UploadWorkflow::new();
        let ticket = workflow.begin_intake();
        workflow.select_file(file("a.png"));

        assert!(!workflow.is_reading());
        assert_eq!(
            workflow.finish_intake(ticket, file("late.png")),
            Intake::Stale("blob:late.png".to_string())
        );
        assert_eq!(workflow.preview_uri(), Some("blob:a.png"));
    }
}
