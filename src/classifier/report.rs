//! Wire format of the classification service.
//!
//! The service answers with its prediction plus the scikit-learn
//! `classification_report(..., output_dict=True)` of the deployed model:
//!
//! ```json
//! {
//!   "prediction": "PNEUMONIA",
//!   "probabilities": {"NORMAL": 0.08, "PNEUMONIA": 0.92},
//!   "accuracy": 0.93,
//!   "report": {
//!     "NORMAL": {"precision": 0.94, "recall": 0.96, "f1-score": 0.95, "support": 220},
//!     "PNEUMONIA": {"precision": 0.89, "recall": 0.91, "f1-score": 0.90, "support": 180},
//!     "accuracy": 0.93,
//!     "macro avg": {...},
//!     "weighted avg": {...}
//!   },
//!   "cm_path": "/static/cm.png"
//! }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::ClassifierError;
use crate::model::{
    AverageMetrics, Analysis, ClassMetrics, ClassProbabilities, MetricsReport, PredictionLabel,
    PredictionResult,
};

const MACRO_AVG: &str = "macro avg";
const WEIGHTED_AVG: &str = "weighted avg";
/// Report keys that are summaries rather than classes.
const SUMMARY_KEYS: &[&str] = &["accuracy", MACRO_AVG, WEIGHTED_AVG, "micro avg", "samples avg"];

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    prediction: Option<String>,
    #[serde(default)]
    probabilities: Option<ClassProbabilities>,
    #[serde(default)]
    accuracy: Option<f64>,
    report: Map<String, Value>,
    #[serde(default)]
    cm_path: Option<String>,
}

/// Decode a service response body. Relative `cm_path` values resolve against `base`.
pub fn decode_response(body: &str, base: &Url) -> Result<Analysis, ClassifierError> {
    let response: ClassifyResponse =
        serde_json::from_str(body).map_err(|e| ClassifierError::Malformed(e.to_string()))?;

    let label = match (&response.prediction, &response.probabilities) {
        (Some(prediction), _) => prediction
            .parse::<PredictionLabel>()
            .map_err(ClassifierError::Malformed)?,
        (None, Some(probabilities)) => {
            PredictionLabel::from_pneumonia_probability(probabilities.pneumonia)
        }
        (None, None) => {
            return Err(ClassifierError::Malformed(
                "response has neither prediction nor probabilities".to_string(),
            ))
        }
    };

    let mut prediction = PredictionResult::new(label);
    if let Some(probabilities) = response.probabilities {
        prediction = prediction.with_probabilities(probabilities);
    }

    let confusion_matrix_url = match response.cm_path.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => base
            .join(path)
            .map_err(|e| ClassifierError::Malformed(format!("bad cm_path {:?}: {}", path, e)))?
            .to_string(),
        None => String::new(),
    };

    let metrics = metrics_from_report(&response.report, response.accuracy, confusion_matrix_url)?;

    Ok(Analysis {
        prediction,
        metrics,
    })
}

/// Convert a scikit-learn classification report into a [`MetricsReport`].
///
/// Class rows keep the report's key order. `accuracy` falls back to the
/// report's own `accuracy` entry when not given separately.
pub fn metrics_from_report(
    report: &Map<String, Value>,
    accuracy: Option<f64>,
    confusion_matrix_url: String,
) -> Result<MetricsReport, ClassifierError> {
    let overall_accuracy = accuracy
        .or_else(|| report.get("accuracy").and_then(Value::as_f64))
        .ok_or_else(|| ClassifierError::Malformed("missing accuracy".to_string()))?;

    let class_metrics = report
        .iter()
        .filter(|(key, _)| !SUMMARY_KEYS.contains(&key.as_str()))
        .map(|(class_name, entry)| {
            let row = average_from_entry(class_name, entry)?;
            Ok(ClassMetrics {
                class_name: class_name.clone(),
                precision: row.precision,
                recall: row.recall,
                f1_score: row.f1_score,
                support: row.support,
            })
        })
        .collect::<Result<Vec<_>, ClassifierError>>()?;

    if class_metrics.is_empty() {
        return Err(ClassifierError::Malformed("report lists no classes".to_string()));
    }

    let macro_avg = required_entry(report, MACRO_AVG)?;
    let weighted_avg = required_entry(report, WEIGHTED_AVG)?;

    Ok(MetricsReport {
        overall_accuracy,
        class_metrics,
        macro_avg,
        weighted_avg,
        confusion_matrix_url,
    })
}

fn required_entry(report: &Map<String, Value>, key: &str) -> Result<AverageMetrics, ClassifierError> {
    let entry = report
        .get(key)
        .ok_or_else(|| ClassifierError::Malformed(format!("missing '{}'", key)))?;
    average_from_entry(key, entry)
}

fn average_from_entry(key: &str, entry: &Value) -> Result<AverageMetrics, ClassifierError> {
    let object = entry
        .as_object()
        .ok_or_else(|| ClassifierError::Malformed(format!("'{}' is not an object", key)))?;

    let number = |field: &str| -> Result<f64, ClassifierError> {
        object
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| ClassifierError::Malformed(format!("'{}' has no numeric {}", key, field)))
    };

    // sklearn writes "f1-score"; hand-written reports tend to use "f1_score".
    let f1_score = number("f1-score").or_else(|_| number("f1_score"))?;
    let support = number("support")?;
    if support < 0.0 {
        return Err(ClassifierError::Malformed(format!("'{}' has negative support", key)));
    }

    Ok(AverageMetrics {
        precision: number("precision")?,
        recall: number("recall")?,
        f1_score,
        support: support.round() as u32,
    })
}
