//! Contact API server.
//!
//! Serves the portfolio contact form: validates submissions, checks the
//! reCAPTCHA token and hands the message to the configured delivery backend.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contact::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("contact_api_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        profile = %config.profile,
        recaptcha_mode = ?config.recaptcha.mode,
        recaptcha_min_score = config.recaptcha.min_score,
        recaptcha_enterprise_configured =
            config.recaptcha.site_key.is_some() && config.recaptcha.api_key.is_some(),
        recaptcha_secret_configured = !config.recaptcha.secret_key.is_empty(),
        delivery_backend = ?config.delivery.backend,
        resend_configured = config.delivery.resend_api_key.is_some(),
        firestore_project = ?config.delivery.firestore_project_id,
        allowed_origins = ?config.allowed_origins,
        "config_loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config));

    // Bind to address
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "contact_api_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("contact_api_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("contact_api_shutting_down");
}
