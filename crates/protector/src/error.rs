//! Internal failure taxonomy of the attribute pipeline.
//!
//! [`PipelineError`] keeps the cause for logs and tests. Callers only ever see
//! the flattened [`ErrorResponse`] produced by its `From` impl, which carries
//! the generic `UNKNOWN` code whatever went wrong.

use common::{ErrorResponse, SdkErrorCode};
use thiserror::Error;

use crate::crypto::CryptoError;

/// Why an attribute pipeline invocation failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The attributes argument was not absent, `null` or a JSON object.
    #[error("invalid attributes format: {0}")]
    InvalidAttributes(String),

    /// `ka_aes_key` was not valid hex or not a valid AES key length.
    #[error("key import failed: {0}")]
    KeyImport(String),

    /// An AES-GCM operation failed.
    #[error("encryption failed: {0}")]
    Encryption(#[source] CryptoError),

    /// A value could not be serialised to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Anything else: random source or digest failure.
    #[error("unknown failure: {0}")]
    Unknown(String),
}

impl PipelineError {
    /// Short, stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidAttributes(_) => "invalid_attributes",
            PipelineError::KeyImport(_) => "key_import",
            PipelineError::Encryption(_) => "encryption",
            PipelineError::Serialization(_) => "serialization",
            PipelineError::Unknown(_) => "unknown",
        }
    }
}

impl From<PipelineError> for ErrorResponse {
    fn from(_: PipelineError) -> Self {
        SdkErrorCode::Unknown.to_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_flattens_to_unknown() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let errors = vec![
            PipelineError::InvalidAttributes("array".into()),
            PipelineError::KeyImport("bad hex".into()),
            PipelineError::Encryption(CryptoError::AeadFailure),
            PipelineError::Serialization(serde_err),
            PipelineError::Unknown("rng".into()),
        ];
        for e in errors {
            let body: ErrorResponse = e.into();
            assert_eq!(body, SdkErrorCode::Unknown.to_response());
        }
    }

    #[test]
    fn kinds_are_distinct() {
        let a = PipelineError::KeyImport("x".into()).kind();
        let b = PipelineError::Encryption(CryptoError::AeadFailure).kind();
        assert_ne!(a, b);
    }
}
