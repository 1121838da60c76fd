//! HTML email for the transactional email backend.

use std::sync::LazyLock;

use serde::Serialize;
use tera::{Context, Tera};

use crate::config::DeliveryConfig;
use crate::format::fallback_subject;
use crate::verify::VerifiedSubmission;

/// Registered with an `.html` name so autoescaping applies.
const TEMPLATE_NAME: &str = "contact_email.html";

static TEMPLATES: LazyLock<Tera> = LazyLock::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, include_str!("../../templates/contact_email.html"))
        .expect("contact email template parses");
    tera
});

/// An email in the shape the Resend `POST /emails` endpoint takes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    /// `Display Name <address>`
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
struct EmailContext<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
    photo: Option<PhotoLines<'a>>,
}

#[derive(Serialize)]
struct PhotoLines<'a> {
    title: &'a str,
    id: &'a str,
}

/// Format a notification email about a submission.
pub fn format_email(
    verified: &VerifiedSubmission,
    config: &DeliveryConfig,
) -> anyhow::Result<EmailMessage> {
    let s = verified.submission();

    let context = Context::from_serialize(EmailContext {
        name: &s.name,
        email: &s.email,
        subject: s.subject.as_deref().unwrap_or_default(),
        message: &s.message,
        photo: s.photo.as_ref().map(|photo| PhotoLines {
            title: photo.title.as_deref().unwrap_or_default(),
            id: photo.id.as_deref().unwrap_or_default(),
        }),
    })?;
    let html = TEMPLATES.render(TEMPLATE_NAME, &context)?;

    Ok(EmailMessage {
        from: format!("{} <{}>", config.sender.name, config.sender.email),
        to: vec![config.recipient.email.clone()],
        reply_to: s.email.clone(),
        subject: fallback_subject(s.name.trim()),
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Profile};
    use crate::format::fixtures;
    use crate::submission::PhotoRef;

    #[test]
    fn test_format_email_headers() {
        let config = Config::for_profile(Profile::Service).delivery;

        let email = format_email(&fixtures::verified(None), &config).unwrap();

        assert_eq!(email.from, "Contact Form <website@jongood.photo>");
        assert_eq!(email.to, vec!["jongood01@gmail.com".to_string()]);
        assert_eq!(email.reply_to, " Ada@Example.com ");
        assert_eq!(email.subject, "Contact Form: Message from Ada Lovelace");
    }

    #[test]
    fn test_format_email_body() {
        let config = Config::for_profile(Profile::Service).delivery;

        let email = format_email(&fixtures::verified(None), &config).unwrap();

        assert!(email.html.starts_with("<h2>New Contact Form Submission</h2>"));
        assert!(email.html.contains("<p><strong>Subject:</strong>  Print enquiry </p>"));
        assert!(email.html.contains("Line one<br>Line &lt;two&gt;"));
        assert!(!email.html.contains("Photo Title"));
    }

    #[test]
    fn test_format_email_with_photo() {
        let config = Config::for_profile(Profile::Service).delivery;
        let photo = PhotoRef {
            id: Some("harbour-01".to_string()),
            title: None,
        };

        let email = format_email(&fixtures::verified(Some(photo)), &config).unwrap();

        assert!(email.html.contains("<p><strong>Photo Title:</strong> </p>"));
        assert!(email.html.contains("<p><strong>Photo ID:</strong> harbour-01</p>"));
    }

    #[test]
    fn test_format_email_escapes_user_text() {
        let config = Config::for_profile(Profile::Service).delivery;
        let mut submission = fixtures::verified(None).submission().clone();
        submission.name = "<b>Tom & Jerry</b>".to_string();
        submission.message = "<script>x</script>\nbye".to_string();

        let email = format_email(&VerifiedSubmission::assume_verified(submission), &config).unwrap();

        assert!(email.html.contains("<p><strong>Name:</strong> &lt;b&gt;Tom &amp; Jerry&lt;"));
        assert!(email.html.contains("<p>&lt;script&gt;x&lt;"));
        assert!(email.html.contains("<br>bye</p>"));
        assert!(!email.html.contains("<script>"));
        assert!(!email.html.contains("&lt;br&gt;"));
    }
}
