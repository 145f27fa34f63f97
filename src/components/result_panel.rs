//! Two-tab panel with the detection result and the model metrics.

use leptos::prelude::*;

use crate::components::metrics_view::MetricsView;
use crate::model::{Analysis, PredictionLabel, PredictionResult};
use crate::presentation::{format_percent, recommendations_for, tab_title};
use crate::workflow::ResultTab;

#[component]
pub fn ResultPanel(
    analysis: Analysis,
    #[prop(into)] tab: Signal<ResultTab>,
    on_tab: Callback<ResultTab>,
) -> impl IntoView {
    let Analysis { prediction, metrics } = analysis;

    view! {
        <div class="results-card">
            <div class="toggle-tabs">
                <TabButton tab=ResultTab::Results active=tab on_tab=on_tab />
                <TabButton tab=ResultTab::Metrics active=tab on_tab=on_tab />
            </div>

            {move || match tab.get() {
                ResultTab::Results => view! {
                    <DetectionResults prediction=prediction.clone() />
                }.into_any(),
                ResultTab::Metrics => view! {
                    <MetricsView report=metrics.clone() />
                }.into_any(),
            }}
        </div>
    }
}

#[component]
fn TabButton(tab: ResultTab, active: Signal<ResultTab>, on_tab: Callback<ResultTab>) -> impl IntoView {
    view! {
        <button
            class="toggle-btn"
            class:active=move || active.get() == tab
            on:click=move |_| on_tab.run(tab)
        >
            {tab_title(tab)}
        </button>
    }
}

#[component]
fn DetectionResults(prediction: PredictionResult) -> impl IntoView {
    let label = prediction.display_text();
    let result_class = match prediction.label {
        PredictionLabel::Normal => "result-box result-normal",
        PredictionLabel::PneumoniaDetected => "result-box result-pneumonia",
    };
    let recommendations = recommendations_for(label);

    view! {
        <div class="results-content fade-in">
            <div class=result_class>
                <h3>"🧠 Detection Results"</h3>
                <p class="result-label">{label}</p>
                {prediction.confidence().map(|confidence| view! {
                    <p class="result-confidence">"Confidence: " {format_percent(confidence)}</p>
                })}
            </div>

            <div class="clinical-card">
                <h3>"📋 Clinical Recommendations"</h3>
                {(!recommendations.is_empty()).then(|| view! {
                    <ul>
                        {recommendations.iter().map(|item| view! { <li>{*item}</li> }).collect::<Vec<_>>()}
                    </ul>
                })}
            </div>
        </div>
    }
}
