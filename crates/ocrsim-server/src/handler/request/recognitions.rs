//! Recognition request types.

use axum::extract::rejection::JsonRejection;
use ocrsim_core::ocr::{BatchRequest, RecognitionRequest};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::extract::{Payload, rejection_details};
use crate::handler::{Error, ErrorKind};

/// Request payload for recognizing one document.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateRecognition {
    /// Client-supplied key echoed back in the result.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub key: String,
    /// Location of the document to recognize.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub url: String,
}

impl CreateRecognition {
    /// Creates a new request payload.
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
        }
    }
}

impl From<CreateRecognition> for RecognitionRequest {
    fn from(request: CreateRecognition) -> Self {
        RecognitionRequest::new(request.key, request.url)
    }
}

impl Payload for CreateRecognition {
    fn malformed(rejection: JsonRejection) -> Error<'static> {
        ErrorKind::MalformedRecognition.with_context(rejection_details(&rejection))
    }

    fn invalid(errors: ValidationErrors) -> Error<'static> {
        ErrorKind::MalformedRecognition.with_context(format!("empty fields: {}", fields(&errors)))
    }
}

/// Request payload for recognizing several documents concurrently.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CreateBatchRecognition {
    /// Documents to recognize; results are returned in the same order.
    #[serde(default)]
    #[validate(length(min = 1), nested)]
    pub items: Vec<CreateRecognition>,
}

impl From<CreateBatchRecognition> for BatchRequest {
    fn from(request: CreateBatchRecognition) -> Self {
        request.items.into_iter().map(Into::into).collect()
    }
}

impl Payload for CreateBatchRecognition {
    fn malformed(rejection: JsonRejection) -> Error<'static> {
        ErrorKind::MalformedBatch.with_context(rejection_details(&rejection))
    }

    fn invalid(errors: ValidationErrors) -> Error<'static> {
        // Item errors are keyed by index; the first one is reported.
        if let Some(ValidationErrorsKind::List(items)) = errors.errors().get("items")
            && let Some((index, item)) = items.iter().next()
        {
            return ErrorKind::MissingItemField
                .with_resource(format!("Item {index}"))
                .with_context(format!("empty fields: {}", fields(item)));
        }

        ErrorKind::MalformedBatch.with_context("items must not be empty")
    }
}

/// Lists the fields that failed validation, sorted by name.
fn fields(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.errors().keys().map(|field| field.to_string()).collect();
    fields.sort();
    fields.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_request_is_valid() {
        assert!(CreateRecognition::new("k1", "http://x").validate().is_ok());
    }

    #[test]
    fn missing_fields_default_to_empty_and_fail() -> anyhow::Result<()> {
        let request: CreateRecognition = serde_json::from_str(r#"{"key":"k1"}"#)?;
        assert_eq!(request.url, "");

        let error = CreateRecognition::invalid(request.validate().expect_err("url is empty"));
        assert_eq!(error.kind(), ErrorKind::MalformedRecognition);
        assert_eq!(error.context(), Some("empty fields: url"));
        Ok(())
    }

    #[test]
    fn empty_batch_is_malformed() {
        let request = CreateBatchRecognition::default();
        let error = CreateBatchRecognition::invalid(request.validate().expect_err("no items"));
        assert_eq!(error.kind(), ErrorKind::MalformedBatch);
    }

    #[test]
    fn first_incomplete_item_is_reported() {
        let request = CreateBatchRecognition {
            items: vec![
                CreateRecognition::new("a", "http://x/a"),
                CreateRecognition::new("b", ""),
                CreateRecognition::new("", "http://x/c"),
            ],
        };

        let error = CreateBatchRecognition::invalid(request.validate().expect_err("item 1"));
        assert_eq!(error.kind(), ErrorKind::MissingItemField);
        assert_eq!(error.resource(), Some("Item 1"));
        assert_eq!(error.context(), Some("empty fields: url"));
    }

    #[test]
    fn batch_converts_in_order() {
        let request = CreateBatchRecognition {
            items: vec![
                CreateRecognition::new("a", "http://x/a"),
                CreateRecognition::new("b", "http://x/b"),
            ],
        };

        let batch = BatchRequest::from(request);
        let keys: Vec<_> = batch.items().iter().map(|item| item.key()).collect();
        assert_eq!(keys, ["a", "b"]);
    }
}
