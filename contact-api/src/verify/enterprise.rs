//! reCAPTCHA Enterprise assessments.
//!
//! Reference: https://cloud.google.com/recaptcha/docs/create-assessment-website

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::config::RecaptchaConfig;
use crate::verify::{TokenVerifier, Verdict};

/// Creates an assessment per token and reads its validity and risk score.
pub struct EnterpriseVerifier {
    client: Client,
    base_url: Url,
    project_id: String,
    expected_action: String,
    site_key: Option<String>,
    api_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentRequest<'a> {
    event: AssessmentEvent<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentEvent<'a> {
    token: &'a str,
    expected_action: &'a str,
    site_key: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Assessment {
    #[serde(default)]
    token_properties: Option<TokenProperties>,
    #[serde(default)]
    risk_analysis: Option<RiskAnalysis>,
}

#[derive(Debug, Deserialize)]
struct TokenProperties {
    #[serde(default)]
    valid: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RiskAnalysis {
    #[serde(default)]
    score: Option<f64>,
}

impl Assessment {
    fn verdict(&self) -> Verdict {
        Verdict {
            valid: self
                .token_properties
                .as_ref()
                .and_then(|p| p.valid)
                .unwrap_or(false),
            score: self
                .risk_analysis
                .as_ref()
                .and_then(|r| r.score)
                .unwrap_or(0.0),
        }
    }
}

impl EnterpriseVerifier {
    pub fn new(client: Client, config: &RecaptchaConfig) -> Self {
        Self {
            client,
            base_url: config.enterprise_url.clone(),
            project_id: config.project_id.clone(),
            expected_action: config.expected_action.clone(),
            site_key: config.site_key.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// `{base}/v1/projects/{project}/assessments?key={api_key}`
    fn assessment_url(&self, api_key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "projects", self.project_id.as_str(), "assessments"]);
        }
        url.query_pairs_mut().append_pair("key", api_key);
        url
    }
}

#[async_trait]
impl TokenVerifier for EnterpriseVerifier {
    async fn verify(&self, token: &str) -> Verdict {
        let (Some(site_key), Some(api_key)) = (self.site_key.as_deref(), self.api_key.as_deref())
        else {
            warn!(
                has_site_key = self.site_key.is_some(),
                has_api_key = self.api_key.is_some(),
                "recaptcha_not_configured"
            );
            return Verdict::rejected();
        };

        info!(
            project_id = %self.project_id,
            token_length = token.len(),
            "recaptcha_assessment_starting"
        );

        let body = AssessmentRequest {
            event: AssessmentEvent {
                token,
                expected_action: &self.expected_action,
                site_key,
            },
        };

        let response = match self
            .client
            .post(self.assessment_url(api_key))
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "recaptcha_transport_failed");
                return Verdict::rejected();
            }
        };

        let status = response.status().as_u16();

        let assessment: Assessment = match response.json().await {
            Ok(a) => a,
            Err(e) => {
                warn!(status_code = status, error = %e, "recaptcha_transport_failed");
                return Verdict::rejected();
            }
        };

        let verdict = assessment.verdict();

        info!(
            status_code = status,
            valid = verdict.valid,
            score = verdict.score,
            "recaptcha_assessment_complete"
        );

        verdict
    }
}
