use leptos::prelude::*;
use tracing::{info, warn};

use pneumoscan::app::App;
use pneumoscan::config::AppConfig;
use pneumoscan::telemetry;

fn main() {
    let (config, config_error) = match AppConfig::from_document() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    telemetry::init(&config.log_filter);
    if let Some(e) = config_error {
        warn!("Ignoring invalid configuration, using defaults: {}", e);
    }
    info!(classifier = ?config.classifier, "starting PneumoScan");

    leptos::mount::mount_to_body(move || view! { <App config=config /> });
}
