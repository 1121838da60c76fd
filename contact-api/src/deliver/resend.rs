//! Transactional email through Resend.
//!
//! Reference: https://resend.com/docs/api-reference/emails/send-email

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

use crate::config::DeliveryConfig;
use crate::deliver::{error_body, Deliverer, DeliveryError};
use crate::format::{Payload, PayloadKind};

const PROVIDER: &str = "resend";

/// Sends [`Payload::Email`] payloads.
pub struct ResendMailer {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(client: Client, config: &DeliveryConfig) -> Self {
        let mut endpoint = config.resend_api_url.clone();
        if let Ok(mut segments) = endpoint.path_segments_mut() {
            segments.pop_if_empty().push("emails");
        }

        Self {
            client,
            endpoint,
            api_key: config.resend_api_key.clone(),
        }
    }
}

#[async_trait]
impl Deliverer for ResendMailer {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Email
    }

    async fn deliver(&self, payload: &Payload) -> Result<String, DeliveryError> {
        let Payload::Email(message) = payload else {
            return Err(DeliveryError::UnsupportedPayload {
                provider: PROVIDER,
                kind: payload.kind(),
            });
        };

        let api_key = self
            .api_key
            .as_deref()
            .ok_or(DeliveryError::NotConfigured(PROVIDER))?;

        info!(
            to_count = message.to.len(),
            html_length = message.html.len(),
            "resend_send_starting"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(message)
            .send()
            .await
            .map_err(|source| DeliveryError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            error!(status_code = status.as_u16(), body = %body, "resend_send_failed");
            return Err(DeliveryError::Provider {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::InvalidResponse {
                provider: PROVIDER,
                detail: e.to_string(),
            })?;

        info!(email_id = %sent.id, "resend_send_complete");

        Ok(sent.id)
    }
}
