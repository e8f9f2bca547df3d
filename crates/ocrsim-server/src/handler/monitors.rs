//! Liveness probe.

use axum::Router;
use axum::routing::get;

use crate::service::ServiceState;

async fn health() -> &'static str {
    "ok"
}

/// Returns a [`Router`] with the health route.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use crate::handler::test::create_test_server;

    #[tokio::test]
    async fn health_answers_ok() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_text("ok");
        Ok(())
    }
}
