//! Text shown by the result panel, kept free of view code.

use crate::workflow::ResultTab;

const NORMAL_RECOMMENDATIONS: &[&str] = &[
    "✅ Lungs appear clear and healthy.",
    "Maintain a balanced diet and regular exercise.",
    "Continue routine health check-ups.",
    "Consult a doctor if any new respiratory symptoms appear.",
];

const PNEUMONIA_RECOMMENDATIONS: &[&str] = &[
    "🩺 Indicators suggest pneumonia — further clinical evaluation is advised.",
    "Schedule a chest CT and complete blood test.",
    "Follow your physician’s antibiotic regimen carefully.",
    "Ensure rest, hydration, and regular temperature monitoring.",
];

/// Clinical recommendations for a displayed prediction label.
///
/// Chosen by the label text so any decoration around the class name works.
pub fn recommendations_for(label_text: &str) -> &'static [&'static str] {
    if label_text.contains("Normal") {
        NORMAL_RECOMMENDATIONS
    } else if label_text.contains("Pneumonia") {
        PNEUMONIA_RECOMMENDATIONS
    } else {
        &[]
    }
}

/// `0.93` → `"93.00%"`.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Precision/recall/F1 cell text.
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

pub fn tab_title(tab: ResultTab) -> &'static str {
    match tab {
        ResultTab::Results => "Detection Results",
        ResultTab::Metrics => "Model Metrics",
    }
}

pub const CONFUSION_MATRIX_UNAVAILABLE: &str = "Confusion matrix unavailable";

/// Image source for the confusion matrix, or `None` when the classifier sent none.
pub fn confusion_matrix_src(url: &str) -> Option<&str> {
    let url = url.trim();
    (!url.is_empty()).then_some(url)
}

/// Human-readable file size for the intake panel.
pub fn format_file_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{} B", bytes)
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KB", bytes_f / KIB)
    } else {
        format!("{:.1} MB", bytes_f / (KIB * KIB))
    }
}
