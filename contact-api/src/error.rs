//! Request-level errors and how they render.
//!
//! Every failure is terminal for the request. Server-side failures render a
//! generic message; their detail only goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::deliver::DeliveryError;
use crate::submission::ValidationError;

/// Why a contact submission did not go through.
#[derive(Debug, Error)]
pub enum ContactError {
    /// Malformed or missing input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The bot check failed; `status` depends on the deployment profile
    #[error("reCAPTCHA verification failed")]
    VerificationRejected { status: StatusCode },

    /// The delivery backend failed
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Anything else
    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl ContactError {
    pub fn status(&self) -> StatusCode {
        match self {
            ContactError::Validation(_) => StatusCode::BAD_REQUEST,
            ContactError::VerificationRejected { status } => *status,
            ContactError::Delivery(_) | ContactError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ContactError::Validation(e) => ErrorResponse {
                error: e.message.clone(),
                reason: Some(e.reason.as_str()),
            },
            ContactError::VerificationRejected { .. } => ErrorResponse {
                error: self.to_string(),
                reason: Some("verification_failed"),
            },
            ContactError::Delivery(_) => ErrorResponse::new("Failed to send message"),
            ContactError::Unexpected(_) => ErrorResponse::new("Internal server error"),
        }
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            reason: None,
        }
    }
}
