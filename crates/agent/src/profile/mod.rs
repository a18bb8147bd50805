//! Secure enrollment profile (SEP) held by the agent.
//!
//! # Lifecycle
//!
//! 1. At startup, [`load_from_file`] reads the JSON profile named by `SEP_PATH`,
//!    if configured, into the [`ProfileStore`].
//! 2. `PUT /v1/profile` replaces it at runtime.
//! 3. Signing handlers take a cheap `Arc` clone via [`ProfileStore::current`].
//!
//! # Security invariants
//!
//! - The profile is never written to disk or logged; its `Debug` output
//!   redacts `ka_aes_key`.

pub mod store;

pub use store::{ProfileError, ProfileStore};

use anyhow::{Context, Result};
use common::SecureEnrollmentProfile;
use tracing::info;

/// Read a JSON profile from `path` and install it in `store`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if its key is
/// not a valid AES key.
pub async fn load_from_file(path: &str, store: &ProfileStore) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read SEP file {path}"))?;
    let sep: SecureEnrollmentProfile =
        serde_json::from_str(&text).with_context(|| format!("SEP file {path} is not valid JSON"))?;
    store
        .store(sep)
        .await
        .context("SEP file contains unusable key material")?;
    info!(path = %path, "secure enrollment profile loaded");
    Ok(())
}
