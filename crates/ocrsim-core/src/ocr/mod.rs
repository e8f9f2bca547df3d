//! Optical Character Recognition (OCR) abstractions.
//!
//! This module provides the provider seam recognition backends implement,
//! the simulated [`MockProvider`], and the [`OcrService`] that orchestrates
//! single and batch requests under a shared cancellation signal.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

mod batch;
mod mock;
mod request;
mod response;
#[cfg(any(test, feature = "test-utils"))]
mod scripted;
mod service;

pub use mock::{MockConfig, MockProvider};
pub use request::{BatchRequest, RecognitionRequest};
pub use response::{BatchResult, RecognitionResult};
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub use scripted::ScriptedProvider;
pub use service::{OcrConfig, OcrService};

pub use crate::{Error, ErrorKind, Result};

/// Type alias for a shared OCR provider.
pub type BoxedOcrProvider = Arc<dyn OcrProvider>;

/// Core trait for recognition backends.
///
/// Implementations must observe `cancellation` while they wait on external
/// work and return [`Error::cancelled`] when it fires first. A provider that
/// has already finished must return its result even if the token fires
/// afterwards.
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    /// Recognizes the document referenced by `request`.
    async fn process(
        &self,
        cancellation: &CancellationToken,
        request: &RecognitionRequest,
    ) -> Result<RecognitionResult>;
}
