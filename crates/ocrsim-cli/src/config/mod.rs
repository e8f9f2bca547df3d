//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── server: ServerConfig          # Host, port, shutdown
//! ├── middleware: MiddlewareConfig  # Request deadline
//! └── service: ServiceConfig        # Item deadline, simulated latency
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! ocrsim-cli --port 9090 --request-timeout 30
//!
//! # Or via environment variables
//! PORT=9090 REQUEST_TIMEOUT=30 ocrsim-cli
//! ```

mod middleware;
mod server;

use std::process;

use anyhow::{Context, anyhow};
use clap::Parser;
pub use middleware::MiddlewareConfig;
use ocrsim_server::service::ServiceConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
///
/// Combines all configuration groups for the ocrsim server:
/// - [`ServerConfig`]: Network binding and shutdown
/// - [`MiddlewareConfig`]: Request deadline
/// - [`ServiceConfig`]: Recognition orchestration and the simulated backend
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "ocrsim")]
#[command(about = "Simulated document recognition server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration.
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Recognition service configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments, so its variables
    /// act as defaults for the `env` fallbacks.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;

        self.middleware
            .recovery
            .validate()
            .map_err(|err| anyhow!(err))
            .context("invalid middleware configuration")?;

        self.service
            .validate()
            .context("invalid service configuration")?;

        Ok(())
    }

    /// Logs configuration at startup.
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            item_timeout_ms = self.service.ocr.item_timeout_ms,
            min_latency_ms = self.service.mock.min_latency_ms,
            max_latency_ms = self.service.mock.max_latency_ms,
            continuation_probability = self.service.mock.continuation_probability,
            "Recognition configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
