//! Bot-defense token verification.
//!
//! Two reCAPTCHA protocols are supported behind [`TokenVerifier`]:
//!
//! - [`EnterpriseVerifier`]: the reCAPTCHA Enterprise assessment API
//! - [`SiteVerifyVerifier`]: the classic `siteverify` form endpoint
//!
//! Each makes exactly one request and never retries. Transport failures are
//! reported as a rejected [`Verdict`], never as an error.

pub mod enterprise;
pub mod siteverify;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{RecaptchaConfig, VerifierKind};
use crate::submission::Submission;

pub use enterprise::EnterpriseVerifier;
pub use siteverify::SiteVerifyVerifier;

/// Outcome of a token check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    /// Whether the service considered the token genuine
    pub valid: bool,
    /// Risk score in `[0, 1]`; lower is more bot-like
    pub score: f64,
}

impl Verdict {
    /// A verdict that never passes.
    pub fn rejected() -> Self {
        Self {
            valid: false,
            score: 0.0,
        }
    }

    /// Whether the submission may proceed. The threshold is inclusive.
    pub fn passes(&self, min_score: f64) -> bool {
        self.valid && self.score >= min_score
    }
}

/// A bot verification strategy.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Check a client-supplied token.
    async fn verify(&self, token: &str) -> Verdict;
}

/// A submission whose token passed verification.
///
/// Only [`check`] hands these out, so a payload can never be built from a
/// submission that skipped the bot check.
#[derive(Debug, Clone)]
pub struct VerifiedSubmission(Submission);

impl VerifiedSubmission {
    pub fn submission(&self) -> &Submission {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn assume_verified(submission: Submission) -> Self {
        Self(submission)
    }
}

/// Run the bot check for a validated submission.
///
/// Returns the failing verdict when the token is rejected.
pub async fn check(
    verifier: &dyn TokenVerifier,
    submission: Submission,
    min_score: f64,
) -> Result<VerifiedSubmission, Verdict> {
    let verdict = verifier.verify(&submission.recaptcha_token).await;

    if verdict.passes(min_score) {
        Ok(VerifiedSubmission(submission))
    } else {
        Err(verdict)
    }
}

/// Build the verifier selected by configuration.
pub fn from_config(client: Client, config: &RecaptchaConfig) -> Arc<dyn TokenVerifier> {
    match config.mode {
        VerifierKind::Enterprise => Arc::new(EnterpriseVerifier::new(client, config)),
        VerifierKind::SiteVerify => Arc::new(SiteVerifyVerifier::new(client, config)),
    }
}
