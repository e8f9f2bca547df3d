//! HTTP server startup and graceful shutdown.

use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::lifecycle::serve_with_shutdown;
use super::{ServerError, ServerResult, shutdown_signal};
use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Starts an HTTP server that shuts down on SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if:
/// - Server configuration is invalid
/// - Cannot bind to the specified address/port
/// - Server encounters a fatal error during operation
/// - In-flight requests outlive the shutdown timeout
pub async fn serve_http(app: Router, server_config: ServerConfig) -> ServerResult<()> {
    if let Err(validation_error) = server_config.validate() {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            error = %validation_error,
            "Invalid server configuration"
        );

        return Err(ServerError::invalid_config(&validation_error));
    }

    serve_until(app, &server_config, shutdown_signal()).await
}

/// Starts an HTTP server that shuts down once `signal` resolves.
///
/// After the signal the listener stops accepting connections and in-flight
/// requests get `shutdown_timeout` to finish.
async fn serve_until(
    app: Router,
    server_config: &ServerConfig,
    signal: impl Future<Output = ()> + Send + 'static,
) -> ServerResult<()> {
    let server_addr = server_config.server_addr();

    let listener = TcpListener::bind(server_addr).await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %err,
            "Failed to bind to address"
        );

        ServerError::bind_error(server_addr, err)
    })?;

    let shutdown = CancellationToken::new();
    let signal_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signal.await;
            shutdown.cancel();
        }
    });

    let shutdown_timeout = server_config.shutdown_timeout();
    let result = serve_with_shutdown(server_config, || async move {
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.clone().cancelled_owned());

        let drain_deadline = async {
            shutdown.cancelled().await;

            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                timeout_secs = shutdown_timeout.as_secs(),
                "Graceful shutdown initiated"
            );

            tokio::time::sleep(shutdown_timeout).await;
        };

        tokio::select! {
            result = server.into_future() => result.map_err(ServerError::Runtime),
            () = drain_deadline => Err(ServerError::Runtime(io::Error::new(
                io::ErrorKind::TimedOut,
                "in-flight requests did not finish before the shutdown timeout",
            ))),
        }
    })
    .await;

    signal_task.abort();
    result
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use axum::routing::get;

    use super::*;

    fn local_config(port: u16) -> ServerConfig {
        ServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            shutdown_timeout: 1,
        }
    }

    #[tokio::test]
    async fn shuts_down_once_signalled() -> anyhow::Result<()> {
        let app = Router::new().route("/health", get(|| async { "ok" }));

        serve_until(app, &local_config(0), async {}).await?;
        Ok(())
    }

    #[tokio::test]
    async fn privileged_port_is_rejected_before_binding() {
        let error = serve_http(Router::new(), local_config(80))
            .await
            .expect_err("port 80 is below the allowed range");

        assert!(matches!(error, ServerError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn occupied_port_is_a_bind_error() -> anyhow::Result<()> {
        let occupied = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let port = occupied.local_addr()?.port();

        let error = serve_until(Router::new(), &local_config(port), async {})
            .await
            .expect_err("port is already bound");

        assert!(matches!(error, ServerError::BindError { .. }));
        assert_eq!(
            error.io_error().map(io::Error::kind),
            Some(io::ErrorKind::AddrInUse)
        );
        Ok(())
    }
}
