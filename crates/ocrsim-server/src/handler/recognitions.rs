//! Document recognition handlers.
//!
//! Both routes run under the request's cancellation signal. A single
//! request answers with the status of its result; a batch always answers 200
//! with one result per item, in input order.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use ocrsim_core::ocr::{BatchRequest, OcrService};

use super::request::{CreateBatchRecognition, CreateRecognition};
use super::response::{BatchRecognition, Recognition};
use crate::extract::{RequestCancellation, ValidateJson};
use crate::handler::Result;
use crate::service::ServiceState;

/// Tracing target for recognition operations.
const TRACING_TARGET: &str = "ocrsim_server::handler::recognitions";

/// Recognizes one document.
#[tracing::instrument(skip_all)]
async fn recognize(
    State(ocr): State<OcrService>,
    cancellation: RequestCancellation,
    ValidateJson(request): ValidateJson<CreateRecognition>,
) -> Result<Recognition> {
    tracing::debug!(
        target: TRACING_TARGET,
        key = %request.key,
        "recognition requested"
    );

    let result = ocr.recognize(&cancellation, request.into()).await;

    tracing::info!(
        target: TRACING_TARGET,
        key = result.key(),
        status_code = result.status_code(),
        "recognition answered"
    );

    Ok(result.into())
}

/// Recognizes several documents concurrently.
#[tracing::instrument(skip_all)]
async fn recognize_batch(
    State(ocr): State<OcrService>,
    cancellation: RequestCancellation,
    ValidateJson(request): ValidateJson<CreateBatchRecognition>,
) -> Result<Json<BatchRecognition>> {
    let batch = BatchRequest::from(request);

    tracing::debug!(
        target: TRACING_TARGET,
        items = batch.len(),
        "batch recognition requested"
    );

    let result = ocr.recognize_batch(&cancellation, &batch).await;

    tracing::info!(
        target: TRACING_TARGET,
        items = result.len(),
        succeeded = result.success_count(),
        "batch recognition answered"
    );

    Ok(Json(result.into()))
}

/// Returns a [`Router`] with all recognition routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/ocr", post(recognize))
        .route("/ocr/batch", post(recognize_batch))
}
