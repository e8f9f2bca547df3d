//! Response types for HTTP handlers.

mod error_response;
mod recognitions;

pub use error_response::ErrorResponse;
pub use recognitions::*;
