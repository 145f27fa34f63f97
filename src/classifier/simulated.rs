//! Stand-in classifier used until a classification service is configured.
//!
//! Waits a fixed delay, picks one of the two labels at random and reports the
//! reference metrics of the VGG16 screening model.

use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use tracing::debug;

use super::{Classifier, ClassifyRequest};
use crate::browser;
use crate::error::ClassifierError;
use crate::model::{
    AverageMetrics, Analysis, ClassMetrics, MetricsReport, PredictionLabel, PredictionResult,
};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

pub const REFERENCE_CONFUSION_MATRIX_URL: &str =
    "https://raw.githubusercontent.com/plotly/datasets/master/heatmap_confusion_matrix.png";

/// Source of uniformly distributed samples in `[0, 1)`.
pub type RandomSource = fn() -> f64;

pub struct SimulatedClassifier {
    delay: Duration,
    random: RandomSource,
}

impl SimulatedClassifier {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            random: js_sys::Math::random,
        }
    }

    pub fn with_random_source(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }
}

impl Default for SimulatedClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Classifier for SimulatedClassifier {
    fn describe(&self) -> String {
        format!("Simulated classifier ({} ms delay, random label)", self.delay.as_millis())
    }

    fn classify(&self, request: ClassifyRequest) -> LocalBoxFuture<'_, Result<Analysis, ClassifierError>> {
        async move {
            if !self.delay.is_zero() {
                browser::sleep(self.delay).await;
            }
            if request.cancellation.is_cancelled() {
                return Err(ClassifierError::Cancelled);
            }

            let label = pick_label((self.random)());
            debug!(token = %request.token, file = %request.file.name, %label, "simulated classification");

            Ok(Analysis {
                prediction: PredictionResult::new(label),
                metrics: reference_metrics(),
            })
        }
        .boxed_local()
    }
}

/// Map a sample in `[0, 1)` onto the two labels with equal probability.
pub fn pick_label(sample: f64) -> PredictionLabel {
    if sample < 0.5 {
        PredictionLabel::Normal
    } else {
        PredictionLabel::PneumoniaDetected
    }
}

/// Published evaluation metrics of the screening model on its test split.
pub fn reference_metrics() -> MetricsReport {
    MetricsReport {
        overall_accuracy: 0.93,
        class_metrics: vec![
            ClassMetrics {
                class_name: "Normal".to_string(),
                precision: 0.94,
                recall: 0.96,
                f1_score: 0.95,
                support: 220,
            },
            ClassMetrics {
                class_name: "Pneumonia".to_string(),
                precision: 0.89,
                recall: 0.91,
                f1_score: 0.90,
                support: 180,
            },
        ],
        macro_avg: AverageMetrics {
            precision: 0.91,
            recall: 0.93,
            f1_score: 0.92,
            support: 400,
        },
        weighted_avg: AverageMetrics {
            precision: 0.92,
            recall: 0.93,
            f1_score: 0.93,
            support: 400,
        },
        confusion_matrix_url: REFERENCE_CONFUSION_MATRIX_URL.to_string(),
    }
}
