//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Recovery: panic recovery and the request deadline that cancels
//!   in-flight recognition work
//! - Observability: request ids and HTTP tracing spans
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::Router;
//! use ocrsim_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};
//!
//! let app: Router = Router::new()
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod deadline;
mod observability;
mod recovery;

pub use deadline::enforce_deadline;
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};

/// Tracing target for request deadlines.
pub const TRACING_TARGET_DEADLINE: &str = "ocrsim_server::middleware::deadline";

/// Tracing target for panic recovery.
pub const TRACING_TARGET_PANIC: &str = "ocrsim_server::recovery::panic";
