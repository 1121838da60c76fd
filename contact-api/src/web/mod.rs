//! HTTP front end for the contact form.
//!
//! Routes:
//! - `GET /`: health check (service profile only)
//! - `POST /api/contact`: submit the form
//! - `OPTIONS /api/contact`: CORS preflight
//!
//! Any other method on `/api/contact` gets a 405. CORS headers are added to
//! every response by [`cors::cors`].

pub mod cors;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, method_not_allowed, preflight, submit_contact, AppState, HealthResponse,
    SubmitResponse,
};

/// Path the contact form posts to.
pub const CONTACT_PATH: &str = "/api/contact";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let contact = post(submit_contact)
        .options(preflight)
        .fallback(method_not_allowed);

    let mut app = Router::new().route(CONTACT_PATH, contact);

    if state.config.profile.serves_health() {
        app = app.route("/", get(health));
    }

    app.layer(middleware::from_fn_with_state(
        state.config.clone(),
        cors::cors,
    ))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
