//! Request deadline as a cancellation source.
//!
//! The deadline does not abort the handler. It cancels the request's
//! [`CancellationToken`] so recognition work observes it and the handler
//! still answers with the results it has.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio_util::sync::CancellationToken;

use super::TRACING_TARGET_DEADLINE;
use crate::extract::RequestCancellation;

/// Arms a per-request cancellation token that fires once `deadline` elapses.
///
/// The token is also cancelled when the request future is dropped, which
/// happens when the client disconnects.
pub async fn enforce_deadline(
    State(deadline): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = CancellationToken::new();
    request
        .extensions_mut()
        .insert(RequestCancellation::new(token.clone()));
    let _guard = token.clone().drop_guard();

    let method = request.method().clone();
    let uri = request.uri().clone();

    let running = next.run(request);
    tokio::pin!(running);

    tokio::select! {
        response = &mut running => response,
        () = tokio::time::sleep(deadline) => {
            tracing::warn!(
                target: TRACING_TARGET_DEADLINE,
                method = %method,
                uri = %uri,
                deadline_ms = deadline.as_millis() as u64,
                "request deadline elapsed, cancelling in-flight work"
            );

            token.cancel();
            running.await
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    /// Waits until the request is cancelled and reports how it ended.
    async fn wait_for_cancellation(cancellation: RequestCancellation) -> &'static str {
        tokio::select! {
            () = cancellation.cancelled() => "cancelled",
            () = tokio::time::sleep(Duration::from_secs(10)) => "finished",
        }
    }

    fn server(deadline: Duration) -> anyhow::Result<TestServer> {
        let app = Router::new()
            .route("/wait", get(wait_for_cancellation))
            .layer(from_fn_with_state(deadline, enforce_deadline));
        Ok(TestServer::new(app)?)
    }

    #[tokio::test]
    async fn deadline_cancels_the_request_token() -> anyhow::Result<()> {
        let server = server(Duration::from_millis(50))?;

        let response = server.get("/wait").await;
        response.assert_status_ok();
        response.assert_text("cancelled");
        Ok(())
    }

    #[tokio::test]
    async fn fast_handlers_are_not_cancelled() -> anyhow::Result<()> {
        async fn quick(cancellation: RequestCancellation) -> String {
            cancellation.is_cancelled().to_string()
        }

        let app = Router::new()
            .route("/quick", get(quick))
            .layer(from_fn_with_state(Duration::from_secs(5), enforce_deadline));
        let server = TestServer::new(app)?;

        server.get("/quick").await.assert_text("false");
        Ok(())
    }
}
