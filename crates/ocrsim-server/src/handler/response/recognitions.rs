//! Recognition response types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ocrsim_core::ocr::{BatchResult, RecognitionResult};
use serde::{Deserialize, Serialize};

/// Outcome of recognizing one document.
///
/// When sent on its own, the HTTP status mirrors `status_code`.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    /// Key of the request this result answers.
    pub key: String,
    /// Outcome status: 200, 408, 499 or 500.
    pub status_code: u16,
    /// Extracted text; empty unless the status is 200.
    pub full_text: String,
    /// Error message; omitted when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub err: String,
}

impl Recognition {
    /// Creates the body of a request rejected before recognition started.
    pub fn rejected(status: StatusCode, err: impl Into<String>) -> Self {
        Self {
            key: String::new(),
            status_code: status.as_u16(),
            full_text: String::new(),
            err: err.into(),
        }
    }

    /// Returns the HTTP status this result is sent with.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<RecognitionResult> for Recognition {
    fn from(result: RecognitionResult) -> Self {
        Self {
            key: result.key().to_owned(),
            status_code: result.status_code(),
            full_text: result.text().to_owned(),
            err: result.error().unwrap_or_default().to_owned(),
        }
    }
}

impl IntoResponse for Recognition {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Results of a batch, in the order of the submitted items.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecognition {
    /// One result per submitted item.
    pub results: Vec<Recognition>,
}

impl From<BatchResult> for BatchRecognition {
    fn from(batch: BatchResult) -> Self {
        Self {
            results: batch.into_results().into_iter().map(Into::into).collect(),
        }
    }
}
