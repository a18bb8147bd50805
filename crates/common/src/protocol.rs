//! Request and response types exchanged between components.
//!
//! These types are serialised as JSON over the agent's HTTP API and are the
//! return types of the attribute pipeline itself.

use serde::{Deserialize, Serialize};

use crate::error::SdkErrorCode;
use crate::profile::IonicAssertion;

// ---------------------------------------------------------------------------
// Attribute signing
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/attributes` and `POST /v1/attributes/mutable`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributesRequest {
    /// Key attributes to protect. Absent and `null` both mean "no attributes".
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
    /// Key request reference the signature is bound to.
    pub key_ref: String,
    /// Conversation identifier the signature is bound to.
    pub conversation_id: String,
    /// Base64 (standard alphabet) of the 16-byte signature nonce.
    pub nonce: String,
}

/// Signed attribute bundle sent alongside a key request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSigningResponse {
    /// The exact JSON string that was hashed.
    pub attrs: String,
    /// `base64(nonce ‖ AES-GCM(SHA-256(attrs)))`.
    pub sig: String,
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/enrollment/assertion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionRequest {
    /// Enrollment endpoint that accepts a SAML response.
    pub enrollment_url: String,
    /// The SAML assertion document, posted as the `SAMLResponse` form field.
    pub saml_assertion_xml: String,
}

/// Successful result of an enrollment exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    /// Always [`SdkErrorCode::Success`].
    pub sdk_response_code: i32,
    /// Header values returned by the enrollment server.
    pub ionic_assertion: IonicAssertion,
}

impl AssertionResponse {
    /// Wrap an assertion in a success envelope.
    pub fn success(ionic_assertion: IonicAssertion) -> Self {
        Self {
            sdk_response_code: SdkErrorCode::Success.code(),
            ionic_assertion,
        }
    }
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Uniform error body: `{ "error": <message>, "sdkResponseCode": <code> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable description safe to expose to callers.
    pub error: String,
    /// Numeric SDK response code.
    #[serde(rename = "sdkResponseCode")]
    pub sdk_response_code: i32,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a message and code.
    pub fn new(error: impl Into<String>, code: SdkErrorCode) -> Self {
        Self {
            error: error.into(),
            sdk_response_code: code.code(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall agent status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether a secure enrollment profile is installed.
    pub profile_ready: bool,
}
