//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup into an immutable [`Config`] that is
//! handed to each component explicitly.

use std::env;
use std::fmt;
use std::str::FromStr;

use axum::http::StatusCode;
use serde::Serialize;
use tracing::warn;
use url::Url;

/// Which deployment the process behaves like.
///
/// The portfolio site historically ran the contact form both as a standalone
/// HTTP service and as a managed function. They share one pipeline and only
/// differ in the knobs exposed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Service,
    Function,
}

impl Profile {
    /// Whether `subject` must be present and non-empty.
    pub fn requires_subject(self) -> bool {
        matches!(self, Profile::Function)
    }

    /// Whether validation messages name the offending field or address.
    pub fn detailed_errors(self) -> bool {
        matches!(self, Profile::Service)
    }

    /// Status returned when the bot check rejects a submission.
    pub fn rejection_status(self) -> StatusCode {
        match self {
            Profile::Service => StatusCode::BAD_REQUEST,
            Profile::Function => StatusCode::FORBIDDEN,
        }
    }

    /// Whether `GET /` answers with a health payload.
    pub fn serves_health(self) -> bool {
        matches!(self, Profile::Service)
    }

    /// Value of `Access-Control-Allow-Methods`.
    pub fn allowed_methods(self) -> &'static str {
        match self {
            Profile::Service => "GET, POST, OPTIONS",
            Profile::Function => "POST, OPTIONS",
        }
    }

    fn default_origins(self) -> Vec<String> {
        let origins: &[&str] = match self {
            Profile::Service => &["https://jongood.photo", "http://localhost:4321"],
            Profile::Function => &[
                "https://jongood.photo",
                "https://jongood.photography",
                "http://localhost:4321",
                "http://localhost:3000",
            ],
        };
        origins.iter().map(|s| s.to_string()).collect()
    }

    fn default_verifier(self) -> VerifierKind {
        match self {
            Profile::Service => VerifierKind::Enterprise,
            Profile::Function => VerifierKind::SiteVerify,
        }
    }

    fn default_delivery(self) -> DeliveryKind {
        match self {
            Profile::Service => DeliveryKind::Resend,
            Profile::Function => DeliveryKind::Firestore,
        }
    }

    fn default_sender(self) -> Mailbox {
        match self {
            Profile::Service => Mailbox::new("website@jongood.photo", "Contact Form"),
            Profile::Function => Mailbox::new(
                "website@test-68zxl27v7xk4j905.mlsender.net",
                "Jon Good Website",
            ),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "service" => Ok(Profile::Service),
            "function" => Ok(Profile::Function),
            other => Err(format!("unknown profile: {other}")),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Service => f.write_str("service"),
            Profile::Function => f.write_str("function"),
        }
    }
}

/// Bot verification protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierKind {
    /// reCAPTCHA Enterprise assessment API
    Enterprise,
    /// Classic `siteverify` form endpoint
    SiteVerify,
}

impl FromStr for VerifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enterprise" => Ok(VerifierKind::Enterprise),
            "siteverify" => Ok(VerifierKind::SiteVerify),
            other => Err(format!("unknown recaptcha mode: {other}")),
        }
    }
}

/// Where formatted messages end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// Transactional email through Resend
    Resend,
    /// Append to a Firestore collection
    Firestore,
}

impl FromStr for DeliveryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resend" => Ok(DeliveryKind::Resend),
            "firestore" => Ok(DeliveryKind::Firestore),
            other => Err(format!("unknown delivery backend: {other}")),
        }
    }
}

/// An email address with a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    pub email: String,
    pub name: String,
}

impl Mailbox {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// reCAPTCHA settings for both protocols.
#[derive(Debug, Clone)]
pub struct RecaptchaConfig {
    /// Which protocol to speak
    pub mode: VerifierKind,

    /// Minimum risk score accepted (inclusive)
    pub min_score: f64,

    /// Enterprise site key
    pub site_key: Option<String>,

    /// Enterprise API key
    pub api_key: Option<String>,

    /// Google Cloud project holding the Enterprise key
    pub project_id: String,

    /// Action the client is expected to have executed
    pub expected_action: String,

    /// Enterprise API base URL
    pub enterprise_url: Url,

    /// Shared secret for the siteverify endpoint
    pub secret_key: String,

    /// Full siteverify endpoint URL
    pub siteverify_url: Url,
}

/// Delivery backend settings.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub backend: DeliveryKind,

    /// Resend API key
    pub resend_api_key: Option<String>,

    /// Resend API base URL
    pub resend_api_url: Url,

    /// Firestore project id
    pub firestore_project_id: Option<String>,

    /// OAuth access token sent as a bearer token to Firestore.
    ///
    /// Read once at startup and never refreshed. Google access tokens (for
    /// example from `gcloud auth print-access-token` or the metadata server)
    /// expire after about an hour, so a long-running process needs a restart
    /// or a sidecar that re-issues the token and restarts it. Unset when
    /// talking to the emulator.
    pub firestore_access_token: Option<String>,

    /// Collection new messages are appended to
    pub firestore_collection: String,

    /// Firestore REST API base URL
    pub firestore_api_url: Url,

    /// Who receives contact messages
    pub recipient: Mailbox,

    /// Who messages are sent from
    pub sender: Mailbox,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Deployment profile
    pub profile: Profile,

    /// Origins that get an `Access-Control-Allow-Origin` header back
    pub allowed_origins: Vec<String>,

    pub recaptcha: RecaptchaConfig,

    pub delivery: DeliveryConfig,
}

impl Config {
    /// Built-in defaults for a profile, without reading the environment.
    pub fn for_profile(profile: Profile) -> Self {
        Config {
            port: 8080,
            profile,
            allowed_origins: profile.default_origins(),
            recaptcha: RecaptchaConfig {
                mode: profile.default_verifier(),
                min_score: 0.5,
                site_key: None,
                api_key: None,
                project_id: "jon-good-photo".to_string(),
                expected_action: "CONTACT_FORM_SUBMIT".to_string(),
                enterprise_url: default_url("https://recaptchaenterprise.googleapis.com"),
                secret_key: String::new(),
                siteverify_url: default_url("https://www.google.com/recaptcha/api/siteverify"),
            },
            delivery: DeliveryConfig {
                backend: profile.default_delivery(),
                resend_api_key: None,
                resend_api_url: default_url("https://api.resend.com"),
                firestore_project_id: None,
                firestore_access_token: None,
                firestore_collection: "emails".to_string(),
                firestore_api_url: default_url("https://firestore.googleapis.com"),
                recipient: Mailbox::new("jongood01@gmail.com", "Jon Good"),
                sender: profile.default_sender(),
            },
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let profile = parse_var("CONTACT_PROFILE", Profile::Service);
        let defaults = Config::for_profile(profile);
        let recaptcha = defaults.recaptcha;
        let delivery = defaults.delivery;

        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),

            profile,

            allowed_origins: parse_csv("ALLOWED_ORIGINS").unwrap_or(defaults.allowed_origins),

            recaptcha: RecaptchaConfig {
                mode: parse_var("RECAPTCHA_MODE", recaptcha.mode),

                min_score: env::var("RECAPTCHA_MIN_SCORE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|s: &f64| (0.0..=1.0).contains(s))
                    .unwrap_or(recaptcha.min_score),

                site_key: non_empty_var("RECAPTCHA_SITE_KEY"),

                api_key: non_empty_var("RECAPTCHA_API_KEY"),

                project_id: env::var("RECAPTCHA_PROJECT_ID").unwrap_or(recaptcha.project_id),

                expected_action: env::var("RECAPTCHA_EXPECTED_ACTION")
                    .unwrap_or(recaptcha.expected_action),

                enterprise_url: parse_url("RECAPTCHA_ENTERPRISE_URL", recaptcha.enterprise_url),

                secret_key: env::var("RECAPTCHA_SECRET_KEY").unwrap_or_default(),

                siteverify_url: parse_url("RECAPTCHA_SITEVERIFY_URL", recaptcha.siteverify_url),
            },

            delivery: DeliveryConfig {
                backend: parse_var("DELIVERY_BACKEND", delivery.backend),

                resend_api_key: non_empty_var("RESEND_API_KEY"),

                resend_api_url: parse_url("RESEND_API_URL", delivery.resend_api_url),

                firestore_project_id: non_empty_var("FIRESTORE_PROJECT_ID"),

                firestore_access_token: non_empty_var("FIRESTORE_ACCESS_TOKEN"),

                firestore_collection: env::var("FIRESTORE_COLLECTION")
                    .unwrap_or(delivery.firestore_collection),

                firestore_api_url: parse_url("FIRESTORE_API_URL", delivery.firestore_api_url),

                recipient: Mailbox {
                    email: env::var("CONTACT_RECIPIENT_EMAIL").unwrap_or(delivery.recipient.email),
                    name: env::var("CONTACT_RECIPIENT_NAME").unwrap_or(delivery.recipient.name),
                },

                sender: Mailbox {
                    email: env::var("CONTACT_SENDER_EMAIL").unwrap_or(delivery.sender.email),
                    name: env::var("CONTACT_SENDER_NAME").unwrap_or(delivery.sender.name),
                },
            },
        }
    }

    /// Whether `origin` is on the CORS allow-list.
    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

fn default_url(raw: &str) -> Url {
    Url::parse(raw).expect("built-in default URL is valid")
}

/// Parse a variable with `FromStr`, warning and falling back on bad input.
fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr<Err = String>,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.parse() {
        Ok(v) => v,
        Err(e) => {
            warn!(env_var = name, value = %raw, error = %e, "Invalid value, using default");
            default
        }
    }
}

/// Parse an absolute URL.
fn parse_url(name: &str, default: Url) -> Url {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match Url::parse(raw.trim()) {
        Ok(url) => url,
        Err(e) => {
            warn!(env_var = name, value = %raw, error = %e, "Invalid URL, using default");
            default
        }
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
