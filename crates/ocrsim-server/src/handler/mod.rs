//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust
//! use ocrsim_server::handler::routes;
//! use ocrsim_server::service::{ServiceConfig, ServiceState};
//!
//! # fn example() -> anyhow::Result<()> {
//! let state = ServiceState::from_config(&ServiceConfig::default())?;
//! let router: axum::Router = routes().with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod error;
mod monitors;
mod recognitions;
pub mod request;
pub mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for rejected requests.
pub const TRACING_TARGET_REJECTION: &str = "ocrsim_server::handler::rejection";

#[inline]
async fn not_found() -> Response {
    ErrorKind::NotFound.into_response()
}

#[inline]
async fn method_not_allowed() -> Response {
    ErrorKind::MethodNotAllowed.into_response()
}

/// Returns a [`Router`] with all routes.
///
/// Unknown paths answer with a JSON 404; known paths requested with another
/// method answer with a JSON 405.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .merge(monitors::routes())
        .merge(recognitions::routes())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
}
