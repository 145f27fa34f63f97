//! Start-up configuration read from `<meta name="pneumoscan:*">` tags.
//!
//! ```html
//! <meta name="pneumoscan:classifier-endpoint" content="/api/classify">
//! <meta name="pneumoscan:classifier-timeout-ms" content="30000">
//! <meta name="pneumoscan:simulated-delay-ms" content="1000">
//! <meta name="pneumoscan:log" content="info,pneumoscan=debug">
//! ```
//!
//! Without an endpoint the simulated classifier is used.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::classifier::{http, simulated, Classifier, HttpClassifier, SimulatedClassifier};
use crate::error::ConfigError;

const META_PREFIX: &str = "pneumoscan:";

pub const KEY_ENDPOINT: &str = "classifier-endpoint";
pub const KEY_TIMEOUT_MS: &str = "classifier-timeout-ms";
pub const KEY_SIMULATED_DELAY_MS: &str = "simulated-delay-ms";
pub const KEY_LOG: &str = "log";

pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierConfig {
    Simulated { delay: Duration },
    Remote { endpoint: Url, timeout: Duration },
}

impl ClassifierConfig {
    pub fn build(&self) -> Arc<dyn Classifier> {
        match self {
            Self::Simulated { delay } => Arc::new(SimulatedClassifier::new(*delay)),
            Self::Remote { endpoint, timeout } => Arc::new(HttpClassifier::new(endpoint.clone(), *timeout)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    /// `EnvFilter` directive string.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::Simulated {
                delay: simulated::DEFAULT_DELAY,
            },
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Build the config from a key lookup. Relative endpoints resolve against `base`.
    pub fn from_lookup<F>(lookup: F, base: Option<&Url>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let classifier = match get(KEY_ENDPOINT) {
            Some(raw) => ClassifierConfig::Remote {
                endpoint: parse_endpoint(&raw, base)?,
                timeout: parse_millis(KEY_TIMEOUT_MS, get(KEY_TIMEOUT_MS))?.unwrap_or(http::DEFAULT_TIMEOUT),
            },
            None => ClassifierConfig::Simulated {
                delay: parse_millis(KEY_SIMULATED_DELAY_MS, get(KEY_SIMULATED_DELAY_MS))?
                    .unwrap_or(simulated::DEFAULT_DELAY),
            },
        };

        Ok(Self {
            classifier,
            log_filter: get(KEY_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    /// Read the `<meta>` tags of the current document.
    pub fn from_document() -> Result<Self, ConfigError> {
        let Some(window) = web_sys::window() else {
            return Ok(Self::default());
        };
        let base = window.location().href().ok().and_then(|href| Url::parse(&href).ok());
        let document = window.document();

        Self::from_lookup(
            |key| {
                let selector = format!("meta[name=\"{}{}\"]", META_PREFIX, key);
                document
                    .as_ref()
                    .and_then(|doc| doc.query_selector(&selector).ok().flatten())
                    .and_then(|meta| meta.get_attribute("content"))
            },
            base.as_ref(),
        )
    }
}

fn parse_endpoint(raw: &str, base: Option<&Url>) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        value: raw.to_string(),
        reason,
    };

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(raw).map_err(|e| invalid(e.to_string()))?,
            None => return Err(invalid("relative endpoint without a page URL".to_string())),
        },
        Err(e) => return Err(invalid(e.to_string())),
    };

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

fn parse_millis(key: &str, raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    raw.map(|value| {
        value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidNumber {
                key: key.to_string(),
                value,
            })
    })
    .transpose()
}
