//! The contact pipeline: validate → verify → format → deliver.
//!
//! Each step only sees the output of the previous one. At most two outbound
//! calls are made per submission, one after the other.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::{Config, DeliveryConfig, Profile};
use crate::deliver::{self, Deliverer};
use crate::error::ContactError;
use crate::format;
use crate::submission;
use crate::verify::{self, TokenVerifier};

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Id assigned by the delivery backend
    pub message_id: String,
}

/// The pipeline with its strategies wired in.
pub struct ContactPipeline {
    profile: Profile,
    min_score: f64,
    delivery: DeliveryConfig,
    verifier: Arc<dyn TokenVerifier>,
    deliverer: Arc<dyn Deliverer>,
}

impl ContactPipeline {
    pub fn new(
        config: &Config,
        verifier: Arc<dyn TokenVerifier>,
        deliverer: Arc<dyn Deliverer>,
    ) -> Self {
        Self {
            profile: config.profile,
            min_score: config.recaptcha.min_score,
            delivery: config.delivery.clone(),
            verifier,
            deliverer,
        }
    }

    /// Build the strategies named in `config`, sharing one HTTP client.
    pub fn from_config(config: &Config, client: Client) -> Self {
        let verifier = verify::from_config(client.clone(), &config.recaptcha);
        let deliverer = deliver::from_config(client, &config.delivery);
        Self::new(config, verifier, deliverer)
    }

    /// Run one raw request body through the whole pipeline.
    pub async fn submit(&self, body: &[u8]) -> Result<Receipt, ContactError> {
        let submission = submission::parse_and_validate(body, self.profile).map_err(|e| {
            warn!(reason = e.reason.as_str(), "contact_validation_failed");
            e
        })?;

        info!(
            has_subject = submission.subject.is_some(),
            has_photo = submission.photo.is_some(),
            message_length = submission.message.len(),
            "contact_submission_validated"
        );

        let verified = verify::check(self.verifier.as_ref(), submission, self.min_score)
            .await
            .map_err(|verdict| {
                warn!(
                    valid = verdict.valid,
                    score = verdict.score,
                    min_score = self.min_score,
                    "contact_verification_rejected"
                );
                ContactError::VerificationRejected {
                    status: self.profile.rejection_status(),
                }
            })?;

        let payload = format::build(
            self.deliverer.payload_kind(),
            &verified,
            &self.delivery,
            Utc::now(),
        )?;

        let message_id = self.deliverer.deliver(&payload).await.map_err(|e| {
            error!(provider = self.deliverer.name(), error = %e, "contact_delivery_failed");
            e
        })?;

        info!(
            provider = self.deliverer.name(),
            message_id = %message_id,
            "contact_delivered"
        );

        Ok(Receipt { message_id })
    }
}
