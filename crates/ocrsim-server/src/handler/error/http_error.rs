//! HTTP error handling with builder pattern for dynamic error responses.
//!
//! Every rejection the boundary produces is an [`Error`]. Its [`ErrorKind`]
//! fixes the status code and the default body; the builder methods refine
//! the message and name the offending resource.

use std::borrow::Cow;
use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::TRACING_TARGET_REJECTION;
use crate::handler::response::{ErrorResponse, Recognition};

/// The error type for HTTP handlers in the server.
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    context: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates a new [`Error`] with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            resource: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Attaches context information to the error.
    ///
    /// Context is logged when the error is rendered and never sent to the
    /// client.
    #[inline]
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    /// Sets the resource that caused the error.
    #[inline]
    pub fn with_resource(self, resource: impl Into<Cow<'a, str>>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..self
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the context if present.
    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns the resource if present.
    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Builds the body this error is rendered as.
    fn response(&self) -> ErrorResponse<'_> {
        let response = self.kind.response();

        match self.resource.as_deref() {
            Some(resource) => response.with_resource(resource),
            None => response,
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.response();

        let mut debug_struct = f.debug_struct("Error");
        debug_struct
            .field("kind", &self.kind)
            .field("status", &response.status)
            .field("error", &response.error);

        if let Some(ref context) = self.context {
            debug_struct.field("context", context);
        }

        debug_struct.finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.response();
        write!(f, "{} ({}): {}", response.name, response.status, response.error)?;

        if let Some(ref context) = self.context {
            write!(f, " - {}", context)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let response = self.response();

        tracing::debug!(
            target: TRACING_TARGET_REJECTION,
            kind = %response.name,
            status = response.status.as_u16(),
            error = %response.error,
            context = self.context.as_deref(),
            "request rejected"
        );

        match self.kind {
            // The single-document route answers in its own result shape.
            ErrorKind::MalformedRecognition => {
                let body = Recognition::rejected(response.status, response.error);
                (response.status, Json(body)).into_response()
            }
            _ => response.into_response(),
        }
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// A specialized [`Result`] type for HTTP operations.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Enumeration of all HTTP error kinds the boundary produces.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // 4xx Client Errors
    /// 400 Bad Request - single-document body is malformed or incomplete
    MalformedRecognition,
    /// 400 Bad Request - batch body is malformed or has no items
    MalformedBatch,
    /// 400 Bad Request - a batch item lacks its key or url
    MissingItemField,
    /// 404 Not Found - no route matches the request
    NotFound,
    /// 405 Method Not Allowed - the route exists but not for this method
    MethodNotAllowed,

    // 5xx Server Errors
    /// 500 Internal Server Error - unexpected server error
    #[default]
    InternalServerError,
}

impl ErrorKind {
    /// Converts this error kind into a full [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    /// Creates an [`Error`] with the specified context.
    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Creates an [`Error`] with the specified resource.
    #[inline]
    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    /// Returns the HTTP status code for this error kind.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the default response of this error kind.
    #[inline]
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::MalformedRecognition => ErrorResponse::MALFORMED_RECOGNITION,
            Self::MalformedBatch => ErrorResponse::MALFORMED_BATCH,
            Self::MissingItemField => ErrorResponse::MISSING_ITEM_FIELD,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::MethodNotAllowed => ErrorResponse::METHOD_NOT_ALLOWED,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.response().name.as_ref())
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.into_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    use super::*;

    async fn body_of(response: Response) -> anyhow::Result<Value> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[test]
    fn default_http_error() {
        let error = Error::default();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(error.kind().status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn malformed_recognition_uses_result_shape() -> anyhow::Result<()> {
        let response = ErrorKind::MalformedRecognition.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await?;
        assert_eq!(
            body,
            json!({
                "key": "",
                "status_code": 400,
                "full_text": "",
                "err": "invalid JSON, expected {key,url}",
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_item_field_names_the_item() -> anyhow::Result<()> {
        let response = ErrorKind::MissingItemField
            .with_resource("Item 2")
            .with_context("url is empty")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await?;
        assert_eq!(body, json!({ "error": "Item 2: key and url are required" }));
        Ok(())
    }

    #[tokio::test]
    async fn not_found_body() -> anyhow::Result<()> {
        let response = ErrorKind::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await?, json!({ "error": "route not found" }));
        Ok(())
    }

    #[tokio::test]
    async fn method_not_allowed_body() -> anyhow::Result<()> {
        let response = ErrorKind::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_of(response).await?, json!({ "error": "method not allowed" }));
        Ok(())
    }

    #[test]
    fn error_builder_chaining() {
        let error = ErrorKind::MalformedBatch
            .with_resource("items")
            .with_context("items is empty");

        assert_eq!(error.kind(), ErrorKind::MalformedBatch);
        assert_eq!(error.resource(), Some("items"));
        assert_eq!(error.context(), Some("items is empty"));
    }

    #[test]
    fn std_fmt_display() {
        let error = ErrorKind::MissingItemField
            .with_resource("Item 0")
            .with_context("key is empty");

        let display = error.to_string();
        assert!(display.contains("missing_item_field"));
        assert!(display.contains("400"));
        assert!(display.contains("Item 0: key and url are required"));
        assert!(display.contains("key is empty"));
    }

    #[test]
    fn all_error_kinds_have_responses() {
        let kinds = [
            ErrorKind::MalformedRecognition,
            ErrorKind::MalformedBatch,
            ErrorKind::MissingItemField,
            ErrorKind::NotFound,
            ErrorKind::MethodNotAllowed,
            ErrorKind::InternalServerError,
        ];

        for kind in kinds {
            let response = kind.response();
            assert!(!response.name.is_empty());
            assert!(!response.error.is_empty());
            assert!(response.status.as_u16() >= 400);
        }
    }
}
