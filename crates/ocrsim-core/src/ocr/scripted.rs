//! Deterministic provider for tests.
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! ocrsim-core = { version = "...", features = ["test-utils"] }
//! ```

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{OcrProvider, RecognitionRequest, RecognitionResult};
use crate::{Error, Result};

/// Provider whose latency and outcome are scripted per key.
///
/// Keys without a scripted delay wait `default_delay`. Completed items carry
/// the text `scripted text for <key>`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    default_delay: Duration,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    panics: HashSet<String>,
}

impl ScriptedProvider {
    /// Creates a provider that completes every item after `default_delay`.
    pub fn new(default_delay: Duration) -> Self {
        Self {
            default_delay,
            ..Self::default()
        }
    }

    /// Scripts the delay of `key`.
    pub fn with_delay(mut self, key: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(key.into(), delay);
        self
    }

    /// Makes `key` fail with a processing error once its delay elapses.
    pub fn with_failure(mut self, key: impl Into<String>) -> Self {
        self.failures.insert(key.into());
        self
    }

    /// Makes `key` panic once its delay elapses.
    pub fn with_panic(mut self, key: impl Into<String>) -> Self {
        self.panics.insert(key.into());
        self
    }

    /// Returns the text a completed `key` carries.
    pub fn text_for(key: &str) -> String {
        format!("scripted text for {key}")
    }
}

#[async_trait::async_trait]
impl OcrProvider for ScriptedProvider {
    async fn process(
        &self,
        cancellation: &CancellationToken,
        request: &RecognitionRequest,
    ) -> Result<RecognitionResult> {
        let key = request.key();
        let delay = self.delays.get(key).copied().unwrap_or(self.default_delay);

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = cancellation.cancelled() => return Err(Error::cancelled()),
        }

        if self.panics.contains(key) {
            panic!("scripted panic for {key}");
        }

        if self.failures.contains(key) {
            return Err(Error::processing("unreadable document"));
        }

        Ok(RecognitionResult::completed(key, Self::text_for(key)))
    }
}
