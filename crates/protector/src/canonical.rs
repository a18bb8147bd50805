//! Canonical serialisation of the assembled attributes and their digest.

use crate::attributes::AttributeMap;
use crate::crypto::{CryptoProvider, DIGEST_LEN};
use crate::error::PipelineError;

/// The transmitted attribute string together with the SHA-256 of its bytes.
///
/// The string is produced once and never re-serialised: the digest is taken
/// over `json.as_bytes()` and the same `String` is moved into the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledAttributes {
    json: String,
    digest: [u8; DIGEST_LEN],
}

impl AssembledAttributes {
    /// Digest of [`AssembledAttributes::as_str`].
    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// The attribute string as transmitted.
    pub fn as_str(&self) -> &str {
        &self.json
    }

    /// Take the attribute string for the response.
    pub fn into_json(self) -> String {
        self.json
    }
}

/// Serialise `attributes` as compact JSON in insertion order.
///
/// # Errors
///
/// Returns [`PipelineError::Serialization`] if serialisation fails.
pub fn serialize(attributes: &AttributeMap) -> Result<String, PipelineError> {
    serde_json::to_string(attributes).map_err(PipelineError::Serialization)
}

/// Hash `json` and bind the digest to that exact string.
///
/// # Errors
///
/// Returns [`PipelineError::Unknown`] if the digest operation fails.
pub async fn hash<P>(provider: &P, json: String) -> Result<AssembledAttributes, PipelineError>
where
    P: CryptoProvider + ?Sized,
{
    let digest = provider
        .digest(json.as_bytes())
        .await
        .map_err(|e| PipelineError::Unknown(format!("digest failed: {e}")))?;
    Ok(AssembledAttributes { json, digest })
}
