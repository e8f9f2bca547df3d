//! Simulated recognition backend.
//!
//! [`MockProvider`] does not fetch or read anything: it waits a randomized
//! latency and then synthesizes a plausible line of document text. The wait
//! is raced against the cancellation signal, so it behaves like a real
//! backend call under deadlines and client disconnects.
//!
//! # Example
//!
//! ```rust
//! use ocrsim_core::ocr::{MockConfig, MockProvider, OcrService};
//!
//! let provider = MockProvider::new(MockConfig {
//!     min_latency_ms: 10,
//!     max_latency_ms: 20,
//!     ..MockConfig::default()
//! });
//! let service = OcrService::new(provider);
//! ```

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{OcrProvider, RecognitionRequest, RecognitionResult};
use crate::{Error, Result, TRACING_TARGET_OCR};

/// Document-type phrases the simulated recognizer reports.
const DOCUMENT_PHRASES: [&str; 10] = [
    "Identification document",
    "Argentine Republic passport",
    "Driver's license",
    "Commercial invoice No. 12345",
    "Birth certificate",
    "Employment contract",
    "Monthly payment receipt",
    "University diploma",
    "VISA credit card",
    "Public utility bill",
];

/// Field names optionally appended to a phrase.
const FIELD_WORDS: [&str; 7] = [
    "validity", "issuance", "number", "date", "code", "series", "emission",
];

/// Range of the number that follows an appended field name.
const FIELD_NUMBERS: Range<u32> = 1000..10000;

/// Configuration for the mock provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct MockConfig {
    /// Lower bound (inclusive) of the simulated latency in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "mock-min-latency-ms",
            env = "MOCK_MIN_LATENCY_MS",
            default_value = "1000"
        )
    )]
    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,

    /// Upper bound (exclusive) of the simulated latency in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "mock-max-latency-ms",
            env = "MOCK_MAX_LATENCY_MS",
            default_value = "4000"
        )
    )]
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,

    /// Probability that a field name and number are appended to the text.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "mock-continuation-probability",
            env = "MOCK_CONTINUATION_PROBABILITY",
            default_value = "0.7"
        )
    )]
    #[serde(default = "default_continuation_probability")]
    pub continuation_probability: f64,
}

fn default_min_latency_ms() -> u64 {
    1000
}

fn default_max_latency_ms() -> u64 {
    4000
}

fn default_continuation_probability() -> f64 {
    0.7
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
            continuation_probability: default_continuation_probability(),
        }
    }
}

impl MockConfig {
    /// Validates the latency range and probability.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.min_latency_ms >= self.max_latency_ms {
            return Err(format!(
                "Mock latency range {}..{} ms is empty. The minimum must be below the maximum.",
                self.min_latency_ms, self.max_latency_ms
            ));
        }

        if !(0.0..=1.0).contains(&self.continuation_probability) {
            return Err(format!(
                "Mock continuation probability {} is invalid. Must be between 0 and 1.",
                self.continuation_probability
            ));
        }

        Ok(())
    }

    /// Returns the simulated latency range in milliseconds.
    pub fn latency_range(&self) -> Range<u64> {
        self.min_latency_ms..self.max_latency_ms
    }
}

/// Simulated recognition provider.
///
/// Cheap to clone; the configuration is shared.
#[derive(Clone, Debug)]
pub struct MockProvider {
    config: Arc<MockConfig>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

impl MockProvider {
    /// Creates a new mock provider with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the provider configuration.
    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Draws the simulated processing delay.
    fn draw_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let range = self.config.latency_range();
        let millis = if range.is_empty() {
            range.start
        } else {
            rng.random_range(range)
        };

        Duration::from_millis(millis)
    }

    /// Synthesizes the text of a recognized document.
    fn synthesize<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let phrase = DOCUMENT_PHRASES.choose(rng).copied().unwrap_or_default();
        let probability = self.config.continuation_probability.clamp(0.0, 1.0);

        if !rng.random_bool(probability) {
            return phrase.to_owned();
        }

        let field = FIELD_WORDS.choose(rng).copied().unwrap_or_default();
        let number = rng.random_range(FIELD_NUMBERS);
        format!("{phrase} {field} {number}")
    }
}

#[async_trait::async_trait]
impl OcrProvider for MockProvider {
    async fn process(
        &self,
        cancellation: &CancellationToken,
        request: &RecognitionRequest,
    ) -> Result<RecognitionResult> {
        let delay = self.draw_delay(&mut rand::rng());

        tracing::trace!(
            target: TRACING_TARGET_OCR,
            key = request.key(),
            locator = request.locator(),
            delay_ms = delay.as_millis() as u64,
            "simulating recognition"
        );

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = cancellation.cancelled() => {
                tracing::debug!(
                    target: TRACING_TARGET_OCR,
                    key = request.key(),
                    "recognition cancelled before completion"
                );
                return Err(Error::cancelled());
            }
        }

        let text = self.synthesize(&mut rand::rng());
        Ok(RecognitionResult::completed(request.key(), text))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn default_provider() -> MockProvider {
        MockProvider::new(MockConfig {
            min_latency_ms: 1000,
            max_latency_ms: 4000,
            continuation_probability: 0.7,
        })
    }

    #[test]
    fn default_config_is_valid() {
        let config = MockConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.latency_range(), 1000..4000);
    }

    #[test]
    fn reject_invalid_config() {
        let mut config = MockConfig::default();
        config.min_latency_ms = 4000;
        assert!(config.validate().is_err());

        let mut config = MockConfig::default();
        config.continuation_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn delay_stays_within_range() {
        let provider = default_provider();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let delay = provider.draw_delay(&mut rng).as_millis() as u64;
            assert!((1000..4000).contains(&delay), "delay {delay} out of range");
        }
    }

    #[test]
    fn synthesized_text_uses_the_corpus() {
        let provider = default_provider();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let text = provider.synthesize(&mut rng);
            let phrase = DOCUMENT_PHRASES
                .iter()
                .find(|p| text.starts_with(*p))
                .expect("text starts with a known phrase");

            let rest = &text[phrase.len()..];
            if rest.is_empty() {
                continue;
            }

            let mut parts = rest.trim_start().split(' ');
            let field = parts.next().expect("field word");
            let number: u32 = parts.next().expect("number").parse().expect("numeric");
            assert!(FIELD_WORDS.contains(&field));
            assert!(FIELD_NUMBERS.contains(&number));
            assert!(parts.next().is_none());
        }
    }

    #[test]
    fn continuation_probability_bounds() {
        let mut rng = StdRng::seed_from_u64(3);

        let never = MockProvider::new(MockConfig {
            continuation_probability: 0.0,
            ..MockConfig::default()
        });
        assert!((0..100).all(|_| DOCUMENT_PHRASES.contains(&never.synthesize(&mut rng).as_str())));

        let always = MockProvider::new(MockConfig {
            continuation_probability: 1.0,
            ..MockConfig::default()
        });
        assert!((0..100).all(|_| !DOCUMENT_PHRASES.contains(&always.synthesize(&mut rng).as_str())));
    }

    #[tokio::test(start_paused = true)]
    async fn completes_with_text_when_not_cancelled() {
        let provider = default_provider();
        let token = CancellationToken::new();
        let request = RecognitionRequest::new("k1", "http://x");

        let result = provider.process(&token, &request).await.expect("completes");
        assert_eq!(result.key(), "k1");
        assert_eq!(result.status_code(), 200);
        assert!(!result.text().is_empty());
        assert_eq!(result.error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_cancellation_when_token_fires_first() {
        let provider = default_provider();
        let token = CancellationToken::new();
        let request = RecognitionRequest::new("k1", "http://x");

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            canceller.cancel();
        });

        let error = provider
            .process(&token, &request)
            .await
            .expect_err("cancelled before the minimum latency");
        assert!(error.is_cancelled());

        let result = RecognitionResult::failed(request.key(), &error);
        assert_eq!(result.status_code(), 408);
        assert_eq!(result.text(), "");
        assert_eq!(result.error(), Some("processing cancelled due to timeout"));
    }
}
