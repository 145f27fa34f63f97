//! Model evaluation metrics: accuracy, per-class table, averages, confusion matrix.

use leptos::prelude::*;

use crate::model::{AverageMetrics, MetricsReport};
use crate::presentation::{
    confusion_matrix_src, format_percent, format_score, CONFUSION_MATRIX_UNAVAILABLE,
};

#[component]
pub fn MetricsView(report: MetricsReport) -> impl IntoView {
    let MetricsReport {
        overall_accuracy,
        class_metrics,
        macro_avg,
        weighted_avg,
        confusion_matrix_url,
    } = report;

    view! {
        <div class="metrics-section fade-in">
            <h3>"📊 Model Evaluation Metrics"</h3>

            <div class="accuracy-box">
                <h4>"Overall Accuracy"</h4>
                <p>{format_percent(overall_accuracy)}</p>
            </div>

            <h4>"Per-Class Metrics"</h4>
            <table class="metrics-table">
                <thead>
                    <tr>
                        <th>"Class"</th>
                        <th>"Precision"</th>
                        <th>"Recall"</th>
                        <th>"F1-Score"</th>
                        <th>"Support"</th>
                    </tr>
                </thead>
                <tbody>
                    {class_metrics.into_iter().map(|m| view! {
                        <tr>
                            <td>{m.class_name}</td>
                            <td>{format_score(m.precision)}</td>
                            <td>{format_score(m.recall)}</td>
                            <td>{format_score(m.f1_score)}</td>
                            <td>{m.support}</td>
                        </tr>
                    }).collect::<Vec<_>>()}
                </tbody>
            </table>

            <h4>"Averages"</h4>
            <table class="metrics-table">
                <tbody>
                    <AverageRow label="Macro Avg" avg=macro_avg />
                    <AverageRow label="Weighted Avg" avg=weighted_avg />
                </tbody>
            </table>

            <div class="confusion-matrix">
                <h4>"Confusion Matrix"</h4>
                {match confusion_matrix_src(&confusion_matrix_url) {
                    Some(src) => view! {
                        <img src=src.to_string() alt="Confusion Matrix" class="confusion-img" />
                    }.into_any(),
                    None => view! {
                        <p class="confusion-missing">{CONFUSION_MATRIX_UNAVAILABLE}</p>
                    }.into_any(),
                }}
            </div>
        </div>
    }
}

#[component]
fn AverageRow(label: &'static str, avg: AverageMetrics) -> impl IntoView {
    view! {
        <tr>
            <td>{label}</td>
            <td>{format_score(avg.precision)}</td>
            <td>{format_score(avg.recall)}</td>
            <td>{format_score(avg.f1_score)}</td>
            <td>{avg.support}</td>
        </tr>
    }
}
