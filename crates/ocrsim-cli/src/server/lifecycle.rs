//! Server lifecycle management.
//!
//! Wraps the serve future with startup logging, uptime reporting and
//! recovery suggestions for common I/O failures.

use std::future::Future;
use std::time::Instant;

use super::{ServerError, ServerResult};
use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Serves with lifecycle logging.
///
/// # Errors
///
/// Returns the error produced by `serve_fn`, after logging it together with
/// a recovery suggestion when one is known.
pub async fn serve_with_shutdown<F>(
    server_config: &ServerConfig,
    serve_fn: impl FnOnce() -> F,
) -> ServerResult<()>
where
    F: Future<Output = ServerResult<()>>,
{
    let start_time = Instant::now();

    log_security_warnings(server_config);

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %server_config.server_addr(),
        "Server is ready and listening for connections"
    );

    let result = serve_fn().await;

    handle_result(result, start_time)
}

/// Logs security warnings for potentially unsafe configurations.
fn log_security_warnings(config: &ServerConfig) {
    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Server bound to all interfaces, ensure firewall is configured"
        );
    }
}

/// Handles the server result and logs appropriate messages.
fn handle_result(result: ServerResult<()>, start_time: Instant) -> ServerResult<()> {
    let uptime = start_time.elapsed();

    match result {
        Ok(()) => {
            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                uptime_secs = uptime.as_secs(),
                "Shutdown completed"
            );
            Ok(())
        }
        Err(err) => {
            log_failure(&err, uptime.as_secs());
            Err(err)
        }
    }
}

fn log_failure(err: &ServerError, uptime_secs: u64) {
    tracing::error!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        error = %err,
        error_code = err.error_code(),
        kind = ?err.io_error().map(std::io::Error::kind),
        uptime_secs,
        "Fatal error"
    );

    if let Some(suggestion) = err.suggestion() {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            suggestion,
            "Recovery suggestion"
        );
    }
}
