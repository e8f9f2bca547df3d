//! Recovery middleware for handling panics and request deadlines.

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;

use super::{TRACING_TARGET_PANIC, enforce_deadline};
use crate::handler::ErrorKind;

type Panic = Box<dyn Any + Send + 'static>;

/// Configuration for recovery middleware behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct RecoveryConfig {
    /// Maximum duration in seconds a request may run before its in-flight
    /// recognition work is cancelled.
    ///
    /// Cancelled single requests answer 499; unfinished batch items answer 408.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value = "15")
    )]
    pub request_timeout: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout: 15,
        }
    }
}

impl RecoveryConfig {
    /// Creates a new configuration with the specified request timeout in seconds.
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            request_timeout: secs,
        }
    }

    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Validates the request timeout.
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout == 0 || self.request_timeout > 300 {
            return Err(format!(
                "Request timeout {} seconds is invalid. Must be between 1 and 300 seconds.",
                self.request_timeout
            ));
        }

        Ok(())
    }
}

/// Extension trait for `axum::`[`Router`] to apply recovery middleware.
pub trait RouterRecoveryExt<S> {
    /// Layers recovery middleware with the provided configuration.
    ///
    /// Handler panics become a JSON 500, and every request gets a
    /// cancellation token that fires at the configured deadline.
    fn with_recovery(self, config: &RecoveryConfig) -> Self;

    /// Layers the request deadline alone, with an arbitrary duration.
    fn with_request_deadline(self, deadline: Duration) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        self.with_request_deadline(config.request_timeout())
            .layer(CatchPanicLayer::custom(catch_panic))
    }

    fn with_request_deadline(self, deadline: Duration) -> Self {
        self.layer(from_fn_with_state(deadline, enforce_deadline))
    }
}

fn catch_panic(err: Panic) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic type");

    tracing::error!(
        target: TRACING_TARGET_PANIC,
        message = %message,
        "service panic"
    );

    ErrorKind::InternalServerError.into_response()
}
