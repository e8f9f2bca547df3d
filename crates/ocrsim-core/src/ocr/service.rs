//! OCR service wrapper with deadlines, cancellation and observability.
//!
//! [`OcrService`] owns a shared [`OcrProvider`] and turns every invocation
//! into a well-formed [`RecognitionResult`]: it never returns an error to the
//! caller. Each result says which party truncated the work when the provider
//! did not finish:
//!
//! | Outcome                                   | Status | Error                           |
//! |-------------------------------------------|--------|---------------------------------|
//! | provider completed                        | 200    | none                            |
//! | provider cancelled by its item deadline   | 408    | `timeout during processing`     |
//! | request cancellation observed             | 499    | `client cancelled the request`  |
//! | provider failed or its task panicked      | 500    | the provider error              |
//!
//! # Example
//!
//! ```rust,no_run
//! use ocrsim_core::ocr::{MockProvider, OcrService, RecognitionRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let service = OcrService::new(MockProvider::default());
//! let cancellation = CancellationToken::new();
//!
//! let request = RecognitionRequest::new("k1", "https://example.com/scan.png");
//! let result = service.recognize(&cancellation, request).await;
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use super::{BoxedOcrProvider, OcrProvider, RecognitionRequest, RecognitionResult};
use crate::{Error, Result, TRACING_TARGET_OCR};

/// Error reported when the item deadline truncated processing.
pub(crate) const TIMEOUT_DURING_PROCESSING: &str = "timeout during processing";

/// Error reported when the request's own cancellation was observed.
pub(crate) const CLIENT_CANCELLED: &str = "client cancelled the request";

/// Configuration for request orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct OcrConfig {
    /// Per-item processing deadline in milliseconds (0 disables it).
    ///
    /// Independent of the request deadline: an item that exceeds it is
    /// reported as a processing timeout while the request is still live.
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-item-timeout-ms", env = "OCR_ITEM_TIMEOUT_MS", default_value = "10000")
    )]
    #[serde(default = "default_item_timeout_ms")]
    pub item_timeout_ms: u64,
}

fn default_item_timeout_ms() -> u64 {
    10_000
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            item_timeout_ms: default_item_timeout_ms(),
        }
    }
}

impl OcrConfig {
    /// Returns the per-item deadline, or `None` when disabled.
    pub fn item_timeout(&self) -> Option<Duration> {
        (self.item_timeout_ms > 0).then(|| Duration::from_millis(self.item_timeout_ms))
    }
}

/// How a single request was resolved.
#[derive(Debug)]
enum Outcome {
    /// The provider finished first.
    Completed(RecognitionResult),
    /// The provider lost its race against the item deadline.
    ProcessingCancelled,
    /// The request's cancellation fired.
    RequestCancelled,
    /// The provider failed or never reported.
    Failed(Error),
}

impl Outcome {
    /// Classifies a finished processing task.
    fn from_task(
        joined: std::result::Result<Result<RecognitionResult>, JoinError>,
        cancellation: &CancellationToken,
    ) -> Self {
        match joined {
            Ok(Ok(result)) => Self::Completed(result),
            Ok(Err(error)) if error.is_cancelled() && cancellation.is_cancelled() => {
                Self::RequestCancelled
            }
            Ok(Err(error)) if error.is_cancelled() => Self::ProcessingCancelled,
            Ok(Err(error)) => Self::Failed(error),
            Err(join_error) => Self::Failed(
                Error::internal("recognition task terminated unexpectedly").with_source(join_error),
            ),
        }
    }

    fn into_result(self, key: String) -> RecognitionResult {
        match self {
            Self::Completed(result) => result,
            Self::ProcessingCancelled => RecognitionResult::rejected(
                key,
                RecognitionResult::STATUS_TIMEOUT,
                TIMEOUT_DURING_PROCESSING,
            ),
            Self::RequestCancelled => RecognitionResult::rejected(
                key,
                RecognitionResult::STATUS_CLIENT_CLOSED,
                CLIENT_CANCELLED,
            ),
            Self::Failed(error) => {
                RecognitionResult::rejected(key, RecognitionResult::STATUS_FAILED, error.message())
            }
        }
    }
}

/// Orchestrates recognition requests against a shared provider.
///
/// Cheap to clone; the provider is shared.
#[derive(Clone)]
pub struct OcrService {
    pub(crate) provider: BoxedOcrProvider,
    pub(crate) item_timeout: Option<Duration>,
}

impl OcrService {
    /// Creates a new service without a per-item deadline.
    pub fn new(provider: impl OcrProvider + 'static) -> Self {
        Self::from_provider(Arc::new(provider))
    }

    /// Creates a new service from an already shared provider.
    pub fn from_provider(provider: BoxedOcrProvider) -> Self {
        Self {
            provider,
            item_timeout: None,
        }
    }

    /// Creates a new service configured by `config`.
    pub fn from_config(config: &OcrConfig, provider: impl OcrProvider + 'static) -> Self {
        Self::new(provider).with_item_timeout(config.item_timeout())
    }

    /// Sets the per-item processing deadline.
    pub fn with_item_timeout(mut self, item_timeout: Option<Duration>) -> Self {
        self.item_timeout = item_timeout;
        self
    }

    /// Returns the per-item processing deadline.
    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout
    }

    /// Recognizes one document, racing the provider against `cancellation`.
    ///
    /// Whichever finishes first decides the result; neither side is polled.
    #[tracing::instrument(skip_all, fields(key = request.key()))]
    pub async fn recognize(
        &self,
        cancellation: &CancellationToken,
        request: RecognitionRequest,
    ) -> RecognitionResult {
        let key = request.key().to_owned();
        let mut task = tokio::spawn(self.item_task(cancellation.clone(), request));

        let outcome = tokio::select! {
            joined = &mut task => Outcome::from_task(joined, cancellation),
            () = cancellation.cancelled() => Outcome::RequestCancelled,
        };

        let result = outcome.into_result(key);

        tracing::debug!(
            target: TRACING_TARGET_OCR,
            key = result.key(),
            status_code = result.status_code(),
            "recognition resolved"
        );

        result
    }

    /// Returns a self-contained future processing one item.
    ///
    /// The provider observes a child of `cancellation` that is additionally
    /// cancelled once the item deadline elapses.
    pub(crate) fn item_task(
        &self,
        cancellation: CancellationToken,
        request: RecognitionRequest,
    ) -> impl Future<Output = Result<RecognitionResult>> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let item_timeout = self.item_timeout;

        async move { process_item(provider.as_ref(), &cancellation, &request, item_timeout).await }
    }
}

impl std::fmt::Debug for OcrService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrService")
            .field("item_timeout", &self.item_timeout)
            .finish_non_exhaustive()
    }
}

/// Runs the provider for one item under the optional item deadline.
async fn process_item(
    provider: &dyn OcrProvider,
    cancellation: &CancellationToken,
    request: &RecognitionRequest,
    item_timeout: Option<Duration>,
) -> Result<RecognitionResult> {
    let Some(item_timeout) = item_timeout else {
        return provider.process(cancellation, request).await;
    };

    let item = cancellation.child_token();
    let processing = provider.process(&item, request);
    tokio::pin!(processing);

    tokio::select! {
        result = &mut processing => result,
        () = tokio::time::sleep(item_timeout) => {
            tracing::debug!(
                target: TRACING_TARGET_OCR,
                key = request.key(),
                timeout_ms = item_timeout.as_millis() as u64,
                "item deadline elapsed"
            );

            item.cancel();
            processing.await
        }
    }
}
