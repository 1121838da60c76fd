//! Contact form backend for the photography portfolio site.
//!
//! A submission goes through one linear pipeline:
//!
//! ```text
//! POST /api/contact → validate → verify token → format → deliver → response
//! ```
//!
//! The token check speaks either reCAPTCHA Enterprise or classic
//! `siteverify`; delivery is either a Resend email or a Firestore document.
//! Both are chosen by [`Config`].

pub mod config;
pub mod deliver;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod submission;
pub mod verify;
pub mod web;

// Re-export commonly used types
pub use config::{Config, Profile};
pub use error::ContactError;
pub use pipeline::{ContactPipeline, Receipt};
pub use submission::{Submission, ValidationError};
pub use web::{router, AppState};
