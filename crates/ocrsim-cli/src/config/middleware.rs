//! Middleware configuration for the HTTP server.
//!
//! Re-uses the recovery settings from `ocrsim-server`, which carry both CLI
//! arguments and environment variables.
//!
//! # Example
//!
//! ```bash
//! ocrsim-cli --request-timeout 30
//! ```

use clap::Args;
use ocrsim_server::middleware::RecoveryConfig;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Middleware configuration.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Recovery middleware configuration.
    ///
    /// Controls the request deadline and panic recovery behavior.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            "Recovery configuration"
        );
    }
}
