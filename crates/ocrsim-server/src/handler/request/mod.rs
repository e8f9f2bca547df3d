//! Request types for HTTP handlers.

mod recognitions;

pub use recognitions::*;
