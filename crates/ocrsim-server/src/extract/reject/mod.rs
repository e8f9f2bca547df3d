//! Validated JSON extraction.
//!
//! Each route answers malformed bodies in its own shape, so the rejection is
//! chosen by the payload type rather than by the extractor.

mod validated_json;

use axum::extract::rejection::JsonRejection;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

pub use self::validated_json::ValidateJson;
use crate::handler::Error;

/// Request body that maps its own extraction failures.
pub trait Payload: DeserializeOwned + Validate {
    /// Returns the error for a body that could not be read or decoded.
    fn malformed(rejection: JsonRejection) -> Error<'static>;

    /// Returns the error for a decoded body that failed validation.
    fn invalid(errors: ValidationErrors) -> Error<'static>;
}

/// Describes a JSON rejection for logs without echoing the whole body.
pub fn rejection_details(rejection: &JsonRejection) -> String {
    let kind = match rejection {
        JsonRejection::JsonDataError(_) => "data",
        JsonRejection::JsonSyntaxError(_) => "syntax",
        JsonRejection::MissingJsonContentType(_) => "content type",
        JsonRejection::BytesRejection(_) => "body",
        _ => "unknown",
    };

    format!("{kind} error: {}", sanitize_error_message(&rejection.body_text()))
}

/// Limits a rejection message to a few short lines.
fn sanitize_error_message(message: &str) -> String {
    let lines = message.lines().take(3).collect::<Vec<_>>();
    lines.join(" ").chars().take(200).collect()
}
