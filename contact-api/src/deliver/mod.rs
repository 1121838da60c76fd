//! Message delivery backends.
//!
//! Both backends implement [`Deliverer`]: take one formatted payload, make
//! exactly one attempt, and return the id the provider assigned. There is no
//! retry and no idempotency key, so a duplicate submission is delivered twice.

pub mod firestore;
pub mod resend;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::{DeliveryConfig, DeliveryKind};
use crate::format::{Payload, PayloadKind};

pub use firestore::FirestoreStore;
pub use resend::ResendMailer;

/// Why a delivery attempt failed. Never shown to the submitter.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{0} delivery is not configured")]
    NotConfigured(&'static str),

    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} responded with status {status}: {body}")]
    Provider {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unreadable response: {detail}")]
    InvalidResponse {
        provider: &'static str,
        detail: String,
    },

    #[error("{provider} cannot deliver a {kind:?} payload")]
    UnsupportedPayload {
        provider: &'static str,
        kind: PayloadKind,
    },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A delivery backend.
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// The payload shape this backend consumes.
    fn payload_kind(&self) -> PayloadKind;

    /// Deliver one payload, returning the provider-assigned id.
    async fn deliver(&self, payload: &Payload) -> Result<String, DeliveryError>;
}

/// Build the backend selected by configuration.
pub fn from_config(client: Client, config: &DeliveryConfig) -> Arc<dyn Deliverer> {
    match config.backend {
        DeliveryKind::Resend => Arc::new(ResendMailer::new(client, config)),
        DeliveryKind::Firestore => Arc::new(FirestoreStore::new(client, config)),
    }
}

/// Read an error body for logging, capped so a huge page can't flood the log.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    body.chars().take(500).collect()
}
