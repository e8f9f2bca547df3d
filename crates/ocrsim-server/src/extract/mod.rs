//! Request extractors with route-specific rejections.
//!
//! - [`ValidateJson`] - JSON extraction with validation, rejected through the
//!   payload's own [`Payload`] mapping
//! - [`RequestCancellation`] - the cancellation signal of the current request

mod cancellation;
mod reject;

pub use crate::extract::cancellation::RequestCancellation;
pub use crate::extract::reject::{Payload, ValidateJson, rejection_details};
