//! Endpoint handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::error::{ContactError, ErrorResponse};
use crate::pipeline::ContactPipeline;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<ContactPipeline>,
}

impl AppState {
    /// Wire up the configured strategies.
    pub fn new(config: Config) -> Self {
        let pipeline = ContactPipeline::from_config(&config, Client::new());
        Self::with_pipeline(config, pipeline)
    }

    pub fn with_pipeline(config: Config, pipeline: ContactPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Contact Form
// =============================================================================

/// Successful submission response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(rename = "messageId")]
    pub message_id: String,
}

/// Contact form endpoint.
///
/// The body is taken as raw bytes so malformed JSON is reported by the
/// validator in the same shape as every other validation failure.
pub async fn submit_contact(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmitResponse>, ContactError> {
    info!(body_length = body.len(), "contact_submission_received");

    // Spawned so that a client disconnect does not abort an in-flight
    // verification or delivery call.
    let pipeline = state.pipeline.clone();
    let receipt = tokio::spawn(async move { pipeline.submit(&body).await })
        .await
        .map_err(|e| {
            error!(error = %e, "contact_pipeline_task_failed");
            ContactError::Unexpected(anyhow::anyhow!("pipeline task failed: {e}"))
        })??;

    Ok(Json(SubmitResponse {
        success: true,
        message_id: receipt.message_id,
    }))
}

/// CORS preflight. Headers are added by the CORS middleware.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Any other method on the contact path.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::new("Method Not Allowed")),
    )
}
