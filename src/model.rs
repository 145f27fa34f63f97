//! Domain types shared by the workflow, the classifiers and the views.
//!
//! Everything here is transient view state: created when the user picks a
//! file or a classifier answers, dropped on the next selection or reload.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

/// An image chosen through the file dialog or dropped on the drop zone.
///
/// Replaced wholesale on every selection, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// MIME type reported by the browser; may be empty.
    pub content_type: String,
    pub bytes: Arc<[u8]>,
    /// Browser-local URI (`blob:` object URL) used to render the preview.
    pub preview_uri: String,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        preview_uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
            preview_uri: preview_uri.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// The two outcomes the screening model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionLabel {
    Normal,
    PneumoniaDetected,
}

impl PredictionLabel {
    /// Sigmoid output at or above this value is read as pneumonia.
    pub const PNEUMONIA_THRESHOLD: f64 = 0.5;

    pub fn from_pneumonia_probability(probability: f64) -> Self {
        if probability >= Self::PNEUMONIA_THRESHOLD {
            Self::PneumoniaDetected
        } else {
            Self::Normal
        }
    }

    /// Decorated text shown in the results tab.
    pub fn display(self) -> &'static str {
        match self {
            Self::Normal => "🟢 Normal",
            Self::PneumoniaDetected => "🟠 Pneumonia Detected",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

impl FromStr for PredictionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "NORMAL" => Ok(Self::Normal),
            "PNEUMONIA" | "PNEUMONIA DETECTED" => Ok(Self::PneumoniaDetected),
            _ => Err(format!("unknown prediction label: {}", s)),
        }
    }
}

/// Per-class probabilities as returned by the classification service.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ClassProbabilities {
    #[serde(rename = "NORMAL")]
    pub normal: f64,
    #[serde(rename = "PNEUMONIA")]
    pub pneumonia: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: PredictionLabel,
    pub probabilities: Option<ClassProbabilities>,
}

impl PredictionResult {
    pub fn new(label: PredictionLabel) -> Self {
        Self {
            label,
            probabilities: None,
        }
    }

    pub fn with_probabilities(mut self, probabilities: ClassProbabilities) -> Self {
        self.probabilities = Some(probabilities);
        self
    }

    pub fn display_text(&self) -> &'static str {
        self.label.display()
    }

    /// Probability assigned to the predicted label, when the classifier reported one.
    pub fn confidence(&self) -> Option<f64> {
        self.probabilities.map(|p| match self.label {
            PredictionLabel::Normal => p.normal,
            PredictionLabel::PneumoniaDetected => p.pneumonia,
        })
    }
}

/// One row of the per-class metrics table.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub class_name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: u32,
}

/// Macro or weighted average row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: u32,
}

/// Evaluation metrics of the model that produced a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    /// Fraction in `0.0..=1.0`.
    pub overall_accuracy: f64,
    /// Rows in the order the report listed them.
    pub class_metrics: Vec<ClassMetrics>,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub confusion_matrix_url: String,
}

/// Prediction and metrics always travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub prediction: PredictionResult,
    pub metrics: MetricsReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parses_service_and_display_forms() {
        assert_eq!("NORMAL".parse::<PredictionLabel>(), Ok(PredictionLabel::Normal));
        assert_eq!("normal".parse::<PredictionLabel>(), Ok(PredictionLabel::Normal));
        assert_eq!(
            "PNEUMONIA".parse::<PredictionLabel>(),
            Ok(PredictionLabel::PneumoniaDetected)
        );
        assert_eq!(
            "Pneumonia_Detected".parse::<PredictionLabel>(),
            Ok(PredictionLabel::PneumoniaDetected)
        );
        assert!("COVID".parse::<PredictionLabel>().is_err());
    }

    #[test]
    fn test_label_from_probability_uses_half_threshold() {
        assert_eq!(
            PredictionLabel::from_pneumonia_probability(0.5),
            PredictionLabel::PneumoniaDetected
        );
        assert_eq!(
            PredictionLabel::from_pneumonia_probability(0.4999),
            PredictionLabel::Normal
        );
    }

    #[test]
    fn test_confidence_follows_predicted_label() {
        let probabilities = ClassProbabilities {
            normal: 0.12,
            pneumonia: 0.88,
        };
        let result =
            PredictionResult::new(PredictionLabel::PneumoniaDetected).with_probabilities(probabilities);
        assert_eq!(result.confidence(), Some(0.88));

        let result = PredictionResult::new(PredictionLabel::Normal).with_probabilities(probabilities);
        assert_eq!(result.confidence(), Some(0.12));

        assert_eq!(PredictionResult::new(PredictionLabel::Normal).confidence(), None);
    }

    #[test]
    fn test_selected_file_size() {
        let file = SelectedFile::new("chest.png", "image/png", vec![1u8, 2, 3], "blob:preview");
        assert_eq!(file.size(), 3);
        assert_eq!(file.preview_uri, "blob:preview");
    }
}
