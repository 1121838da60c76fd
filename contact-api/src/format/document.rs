//! Append-only message record for the document store backend.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::{DeliveryConfig, Mailbox};
use crate::format::fallback_subject;
use crate::submission::PhotoRef;
use crate::verify::VerifiedSubmission;

/// A stored contact message. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDocument {
    pub to: Vec<Mailbox>,
    pub from: Mailbox,
    pub reply_to: Mailbox,
    pub subject: String,
    /// Flattened plain-text rendering of the whole message
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoRef>,
    /// RFC 3339 UTC timestamp with millisecond precision
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Format the record stored for a submission.
pub fn format_document(
    verified: &VerifiedSubmission,
    config: &DeliveryConfig,
    now: DateTime<Utc>,
) -> ContactDocument {
    let s = verified.submission();

    let name = s.name.trim();
    let email = s.email.trim().to_lowercase();

    let photo_part = s
        .photo
        .as_ref()
        .map(|p| {
            format!(
                "Photo: {} \n\n {}",
                p.title.as_deref().unwrap_or_default(),
                p.id.as_deref().unwrap_or_default()
            )
        })
        .unwrap_or_default();

    let text = format!(
        "From: {} <{}> \n\n {} \n\n {}",
        name,
        email,
        s.message.trim(),
        photo_part
    );

    let subject = s
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback_subject(name));

    ContactDocument {
        to: vec![config.recipient.clone()],
        from: config.sender.clone(),
        reply_to: Mailbox::new(email, name),
        subject,
        text,
        photo: s.photo.clone(),
        created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}
