//! Common error type definitions.

use std::borrow::Cow;

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Status code reported for an item whose processing was cancelled.
pub const STATUS_CANCELLED: u16 = 408;

/// Status code reported for an item whose processing failed.
pub const STATUS_FAILED: u16 = 500;

/// Categories of errors that can occur while recognizing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Processing lost the race against its cancellation signal.
    Cancelled,
    /// The recognition backend failed to process the document.
    Processing,
    /// The processing task terminated without reporting an outcome.
    Internal,
}

/// A structured error type for recognition operations.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates the error a provider reports when its cancellation signal fires
    /// before processing completes.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "processing cancelled due to timeout")
    }

    /// Creates a new processing error.
    pub fn processing(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Processing, message)
    }

    /// Creates a new internal error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the error reports a lost cancellation race.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    /// Returns the status code a result carrying this error reports.
    pub fn status_code(&self) -> u16 {
        match self.kind {
            ErrorKind::Cancelled => STATUS_CANCELLED,
            ErrorKind::Processing | ErrorKind::Internal => STATUS_FAILED,
        }
    }
}
