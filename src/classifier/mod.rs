//! The classification collaborator.
//!
//! The workflow only knows the [`Classifier`] capability. `SimulatedClassifier`
//! stands in while no service is deployed; `HttpClassifier` talks to a real one.

pub mod http;
pub mod report;
pub mod simulated;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{self, Either, LocalBoxFuture};

use crate::error::ClassifierError;
use crate::model::{Analysis, SelectedFile};

pub use http::HttpClassifier;
pub use simulated::SimulatedClassifier;

/// Identifies one analysis invocation. Issued in strictly increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(pub u64);

impl RequestToken {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared flag tripped when the request's result is no longer wanted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drive `work` until it finishes or `cancellation` trips.
///
/// The flag is checked again each time a `tick` future completes. Returns
/// `None` when cancelled; `work` is dropped unfinished.
pub async fn until_cancelled<W, S, T>(
    work: W,
    cancellation: &CancellationToken,
    mut tick: impl FnMut() -> S,
) -> Option<T>
where
    W: Future<Output = T>,
    S: Future<Output = ()>,
{
    let watch = async move {
        while !cancellation.is_cancelled() {
            tick().await;
        }
    };
    futures::pin_mut!(work, watch);

    match future::select(work, watch).await {
        Either::Left((value, _)) => Some(value),
        Either::Right(((), _)) => None,
    }
}

/// Everything a classifier needs for one invocation.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub token: RequestToken,
    pub file: SelectedFile,
    pub cancellation: CancellationToken,
}

/// Classifies a chest X-ray and reports the metrics of the model used.
pub trait Classifier: Send + Sync {
    /// Short human-readable description, shown on the About page.
    fn describe(&self) -> String;

    fn classify(&self, request: ClassifyRequest) -> LocalBoxFuture<'_, Result<Analysis, ClassifierError>>;
}
