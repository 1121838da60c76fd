//! Contact form submissions and their validation.
//!
//! The request body arrives as untyped JSON. [`validate`] turns it into a
//! typed [`Submission`] or reports the first check that failed.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::Profile;

/// Deliberately loose: one run without whitespace or `@`, an `@`, another
/// such run, a dot, and a trailing run.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Generic message used when the profile hides validation details.
const GENERIC_INVALID: &str = "Invalid or missing required fields";

/// Reference to the portfolio photo a message is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A contact form submission that passed field validation.
///
/// Values are kept as received; formatters decide on trimming.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub photo: Option<PhotoRef>,
    pub recaptcha_token: String,
}

/// Machine-readable cause of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    MalformedBody,
    MissingToken,
    MissingFields,
    InvalidEmail,
}

impl ValidationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationReason::MalformedBody => "malformed_body",
            ValidationReason::MissingToken => "missing_token",
            ValidationReason::MissingFields => "missing_fields",
            ValidationReason::InvalidEmail => "invalid_email",
        }
    }
}

/// A rejected submission, with the message returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub reason: ValidationReason,
    pub message: String,
}

impl ValidationError {
    fn new(reason: ValidationReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    fn for_profile(profile: Profile, reason: ValidationReason, detail: String) -> Self {
        if profile.detailed_errors() {
            Self::new(reason, detail)
        } else {
            Self::new(reason, GENERIC_INVALID)
        }
    }
}

/// Whether `email` has the `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Parse a raw request body and validate it.
pub fn parse_and_validate(body: &[u8], profile: Profile) -> Result<Submission, ValidationError> {
    let raw: Value = serde_json::from_slice(body).map_err(|_| {
        ValidationError::for_profile(
            profile,
            ValidationReason::MalformedBody,
            "Request body must be a JSON object".to_string(),
        )
    })?;

    validate(&raw, profile)
}

/// Validate an untyped submission.
///
/// The first failing check wins; nothing is partially accepted.
pub fn validate(raw: &Value, profile: Profile) -> Result<Submission, ValidationError> {
    let Some(fields) = raw.as_object() else {
        return Err(ValidationError::for_profile(
            profile,
            ValidationReason::MalformedBody,
            "Request body must be a JSON object".to_string(),
        ));
    };

    let token = required_str(fields, "recaptchaToken");
    let name = required_str(fields, "name");
    let email = required_str(fields, "email");
    let message = required_str(fields, "message");
    let subject = required_str(fields, "subject");

    // The detailed profile reports a missing token before anything else.
    if profile.detailed_errors() && token.is_none() {
        return Err(ValidationError::new(
            ValidationReason::MissingToken,
            "Missing reCAPTCHA token",
        ));
    }

    let (Some(name), Some(email), Some(message)) = (name, email, message) else {
        return Err(ValidationError::for_profile(
            profile,
            ValidationReason::MissingFields,
            "Missing one or more required fields: name, email, message".to_string(),
        ));
    };

    if profile.requires_subject() && subject.is_none() {
        return Err(ValidationError::for_profile(
            profile,
            ValidationReason::MissingFields,
            "Missing required field: subject".to_string(),
        ));
    }

    if !is_valid_email(email) {
        return Err(ValidationError::for_profile(
            profile,
            ValidationReason::InvalidEmail,
            format!("Invalid email address: {email}"),
        ));
    }

    let Some(token) = token else {
        return Err(ValidationError::for_profile(
            profile,
            ValidationReason::MissingToken,
            "Missing reCAPTCHA token".to_string(),
        ));
    };

    Ok(Submission {
        name: name.to_string(),
        email: email.to_string(),
        subject: subject.map(str::to_string),
        message: message.to_string(),
        photo: photo_ref(fields),
        recaptcha_token: token.to_string(),
    })
}

/// A string field that is non-empty after trimming.
fn required_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn optional_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Accepts either a nested `photo: {id, title}` object or the flat
/// `photoId` / `photoTitle` fields. The nested form wins.
fn photo_ref(fields: &Map<String, Value>) -> Option<PhotoRef> {
    let photo = match fields.get("photo").and_then(Value::as_object) {
        Some(nested) => PhotoRef {
            id: optional_str(nested, "id"),
            title: optional_str(nested, "title"),
        },
        None => PhotoRef {
            id: optional_str(fields, "photoId"),
            title: optional_str(fields, "photoTitle"),
        },
    };

    (photo.id.is_some() || photo.title.is_some()).then_some(photo)
}
