//! HTTP server startup with lifecycle management.

mod error;
mod http_server;
mod lifecycle;
mod shutdown;

use axum::Router;
pub use error::{ServerError, ServerResult};
use http_server::serve_http;
use shutdown::shutdown_signal;

use crate::config::ServerConfig;

/// Starts the HTTP server and runs it until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if:
/// - Server configuration is invalid
/// - Cannot bind to the specified address/port
/// - Server encounters a fatal error during operation
/// - In-flight requests outlive the shutdown timeout
pub async fn serve(app: Router, config: ServerConfig) -> ServerResult<()> {
    serve_http(app, config).await
}
