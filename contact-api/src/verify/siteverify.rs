//! Classic reCAPTCHA `siteverify` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::config::RecaptchaConfig;
use crate::verify::{TokenVerifier, Verdict};

/// Posts the shared secret and the token as a form; reads `success` and `score`.
pub struct SiteVerifyVerifier {
    client: Client,
    url: Url,
    secret: String,
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl SiteVerifyVerifier {
    pub fn new(client: Client, config: &RecaptchaConfig) -> Self {
        Self {
            client,
            url: config.siteverify_url.clone(),
            secret: config.secret_key.clone(),
        }
    }
}

#[async_trait]
impl TokenVerifier for SiteVerifyVerifier {
    async fn verify(&self, token: &str) -> Verdict {
        info!(
            has_secret = !self.secret.is_empty(),
            token_length = token.len(),
            "recaptcha_siteverify_starting"
        );

        let result = self
            .client
            .post(self.url.clone())
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await;

        let response = match result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "recaptcha_transport_failed");
                return Verdict::rejected();
            }
        };

        let status = response.status().as_u16();

        let parsed: SiteVerifyResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(status_code = status, error = %e, "recaptcha_transport_failed");
                return Verdict::rejected();
            }
        };

        if !parsed.error_codes.is_empty() {
            warn!(error_codes = ?parsed.error_codes, "recaptcha_rejected");
        }

        let verdict = Verdict {
            valid: parsed.success,
            score: parsed.score.unwrap_or(0.0),
        };

        info!(
            status_code = status,
            valid = verdict.valid,
            score = verdict.score,
            "recaptcha_siteverify_complete"
        );

        verdict
    }
}
