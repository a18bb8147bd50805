//! [`ProfileStore`]: thread-safe holder for the current enrollment profile.

use std::sync::Arc;

use common::SecureEnrollmentProfile;
use protector::{key_import::import_profile_key, RustCryptoProvider};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors produced by the profile layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    /// No profile has been installed yet.
    #[error("secure enrollment profile not yet installed")]
    NotInitialised,

    /// `ka_aes_key` is not hex for a 128, 192 or 256-bit AES key.
    #[error("unusable ka_aes_key: {0}")]
    InvalidKey(String),
}

/// Thread-safe store for the current secure enrollment profile.
///
/// Wraps an `Arc<RwLock<Option<Arc<_>>>>` so that:
/// - Many concurrent signing handlers can read the profile without contention.
/// - A profile update swaps the `Arc` under a short write lock; in-flight
///   requests keep the profile they started with.
#[derive(Clone, Debug, Default)]
pub struct ProfileStore {
    inner: Arc<RwLock<Option<Arc<SecureEnrollmentProfile>>>>,
}

impl ProfileStore {
    /// Create a new, empty [`ProfileStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a profile is currently installed.
    pub async fn is_ready(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Install (or replace) the current profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidKey`] if `ka_aes_key` cannot be imported;
    /// the previous profile is kept.
    pub async fn store(&self, sep: SecureEnrollmentProfile) -> Result<(), ProfileError> {
        // Trial import so a bad key is rejected here, not on every signing call.
        import_profile_key(&RustCryptoProvider, &sep)
            .await
            .map_err(|e| ProfileError::InvalidKey(e.to_string()))?;
        let mut lock = self.inner.write().await;
        *lock = Some(Arc::new(sep));
        Ok(())
    }

    /// The current profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotInitialised`] if no profile has been stored.
    pub async fn current(&self) -> Result<Arc<SecureEnrollmentProfile>, ProfileError> {
        let lock = self.inner.read().await;
        lock.as_ref().cloned().ok_or(ProfileError::NotInitialised)
    }
}
