//! Shared application state injected into every Axum handler.

use protector::{AttributeProtector, EnrollmentClient, RustCryptoProvider};

use crate::profile::ProfileStore;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-backed or zero-sized) so that Axum
/// can clone the state for each request.
#[derive(Clone)]
pub struct AppState {
    /// The currently installed secure enrollment profile.
    pub profile_store: ProfileStore,
    /// Attribute pipeline over the production crypto provider.
    pub protector: AttributeProtector<RustCryptoProvider>,
    /// Client for the enrollment server.
    pub enrollment: EnrollmentClient,
}

impl AppState {
    /// Create a new [`AppState`] with the provided store and enrollment client.
    pub fn new(profile_store: ProfileStore, enrollment: EnrollmentClient) -> Self {
        Self {
            profile_store,
            protector: AttributeProtector::new(RustCryptoProvider),
            enrollment,
        }
    }
}

impl Default for AppState {
    /// Creates a default [`AppState`] with no profile installed, suitable for tests.
    fn default() -> Self {
        Self::new(ProfileStore::new(), EnrollmentClient::default())
    }
}
