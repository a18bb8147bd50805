//! `attr-agent`: Agent binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (OTEL + tracing).
//! 3. Create the [`ProfileStore`] and load `SEP_PATH` into it, if set.
//! 4. Build the enrollment client.
//! 5. Build the Axum router and start the HTTP(S) server.

mod config;
mod profile;
mod server;
mod telemetry;

use std::time::Duration;

use anyhow::{Context, Result};
use protector::EnrollmentClient;
use tracing::{info, warn};

use config::Config;
use profile::ProfileStore;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        tls = cfg.tls_paths().is_some(),
        "attr-agent starting"
    );

    // -----------------------------------------------------------------------
    // 3. Enrollment profile
    // -----------------------------------------------------------------------
    let profile_store = ProfileStore::new();
    match &cfg.sep_path {
        Some(path) => profile::load_from_file(path, &profile_store).await?,
        None => warn!("SEP_PATH not set; signing is unavailable until PUT /v1/profile"),
    }

    // -----------------------------------------------------------------------
    // 4. Enrollment client
    // -----------------------------------------------------------------------
    let enrollment = EnrollmentClient::new(Duration::from_secs(cfg.enrollment_timeout_secs))
        .context("failed to build enrollment HTTP client")?;

    // -----------------------------------------------------------------------
    // 5. HTTP(S) server
    // -----------------------------------------------------------------------
    let state = AppState::new(profile_store, enrollment);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    match cfg.tls_paths() {
        Some((cert, key)) => {
            let tls = server::tls::load_server_config(cert, key).await?;
            server::tls::serve(listener, tls, router).await?;
        }
        None => {
            warn!(addr = %addr, "TLS not configured; serving plain HTTP");
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
