use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// HTTP error response representation.
///
/// Serialized as `{"error": "..."}`; the name and status only select the
/// HTTP status line and label the error in logs.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse<'a> {
    /// The error name/type identifier (not serialized in JSON)
    #[serde(skip)]
    pub name: Cow<'a, str>,
    /// Error message safe for client display
    pub error: Cow<'a, str>,
    /// HTTP status code (not serialized in JSON)
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    // 4xx Client Errors
    pub const MALFORMED_RECOGNITION: Self = Self::new(
        "malformed_recognition",
        "invalid JSON, expected {key,url}",
        StatusCode::BAD_REQUEST,
    );
    pub const MALFORMED_BATCH: Self = Self::new(
        "malformed_batch",
        "invalid JSON, expected {items:[{key,url},...]}",
        StatusCode::BAD_REQUEST,
    );
    pub const MISSING_ITEM_FIELD: Self = Self::new(
        "missing_item_field",
        "key and url are required",
        StatusCode::BAD_REQUEST,
    );
    pub const NOT_FOUND: Self = Self::new("not_found", "route not found", StatusCode::NOT_FOUND);
    pub const METHOD_NOT_ALLOWED: Self = Self::new(
        "method_not_allowed",
        "method not allowed",
        StatusCode::METHOD_NOT_ALLOWED,
    );
    // 5xx Server Errors
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "internal server error",
        StatusCode::INTERNAL_SERVER_ERROR,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, error: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            error: Cow::Borrowed(error),
            status,
        }
    }

    /// Prefixes the error message with the offending resource.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        self.error = Cow::Owned(format!("{}: {}", resource.into(), self.error));
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_only_the_error() -> anyhow::Result<()> {
        let json = serde_json::to_value(ErrorResponse::NOT_FOUND)?;
        assert_eq!(json, serde_json::json!({ "error": "route not found" }));
        Ok(())
    }

    #[test]
    fn resource_prefixes_message() {
        let response = ErrorResponse::MISSING_ITEM_FIELD.with_resource("Item 3");
        assert_eq!(response.error, "Item 3: key and url are required");
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }
}
