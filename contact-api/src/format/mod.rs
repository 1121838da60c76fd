//! Turning a verified submission into something a delivery backend accepts.
//!
//! ```text
//! VerifiedSubmission → build() → Payload::Email | Payload::Document
//! ```

pub mod document;
pub mod email;

use chrono::{DateTime, Utc};

use crate::config::DeliveryConfig;
use crate::verify::VerifiedSubmission;

pub use document::{format_document, ContactDocument};
pub use email::{format_email, EmailMessage};

/// Which payload shape a delivery backend consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Email,
    Document,
}

/// A delivery-ready message.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Email(EmailMessage),
    Document(ContactDocument),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Email(_) => PayloadKind::Email,
            Payload::Document(_) => PayloadKind::Document,
        }
    }
}

/// Build the payload of the requested kind. `now` stamps documents.
pub fn build(
    kind: PayloadKind,
    verified: &VerifiedSubmission,
    config: &DeliveryConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<Payload> {
    Ok(match kind {
        PayloadKind::Email => Payload::Email(format_email(verified, config)?),
        PayloadKind::Document => Payload::Document(format_document(verified, config, now)),
    })
}

/// Subject used when the submitter did not provide one.
pub(crate) fn fallback_subject(name: &str) -> String {
    format!("Contact Form: Message from {name}")
}
