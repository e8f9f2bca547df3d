//! Response types for OCR operations.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Outcome of recognizing one document.
///
/// A successful result carries text and status 200; any other status carries
/// an error message and no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    key: String,
    status_code: u16,
    text: String,
    error: Option<String>,
}

impl RecognitionResult {
    /// Status code of a completed recognition.
    pub const STATUS_OK: u16 = 200;
    /// Status code of a request abandoned by its client.
    pub const STATUS_CLIENT_CLOSED: u16 = 499;
    /// Status code of a request truncated by a timeout.
    pub const STATUS_TIMEOUT: u16 = crate::error::STATUS_CANCELLED;
    /// Status code of a failed item.
    pub const STATUS_FAILED: u16 = crate::error::STATUS_FAILED;

    /// Creates a successful result carrying the extracted text.
    pub fn completed(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status_code: Self::STATUS_OK,
            text: text.into(),
            error: None,
        }
    }

    /// Creates an unsuccessful result with the given status and message.
    pub fn rejected(key: impl Into<String>, status_code: u16, error: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status_code,
            text: String::new(),
            error: Some(error.into()),
        }
    }

    /// Creates the result a provider error resolves to.
    pub fn failed(key: impl Into<String>, error: &Error) -> Self {
        Self::rejected(key, error.status_code(), error.message())
    }

    /// Returns the key of the request this result answers.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Returns the extracted text, empty unless the result is successful.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns `true` if the document was recognized.
    pub fn is_success(&self) -> bool {
        self.status_code == Self::STATUS_OK
    }
}

/// Results of a batch, index-aligned with the batch items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    results: Vec<RecognitionResult>,
}

impl BatchResult {
    /// Creates a batch result from index-aligned results.
    pub fn new(results: Vec<RecognitionResult>) -> Self {
        Self { results }
    }

    /// Returns the results in input order.
    pub fn results(&self) -> &[RecognitionResult] {
        &self.results
    }

    /// Consumes the batch and returns the results.
    pub fn into_results(self) -> Vec<RecognitionResult> {
        self.results
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the number of successful results.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }
}
