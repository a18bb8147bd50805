//! SDK response codes and the agent-level service error.

use thiserror::Error;

use crate::protocol::ErrorResponse;

/// Numeric response codes carried in `sdkResponseCode`.
///
/// Every attribute-protection failure is reported as [`SdkErrorCode::Unknown`],
/// whatever the underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkErrorCode {
    /// The operation completed.
    Success,
    /// Any failure of the attribute pipeline, or an unexpected upstream status.
    Unknown,
    /// The HTTP request to an upstream server could not be completed.
    RequestFailed,
}

impl SdkErrorCode {
    /// Wire value of this code.
    pub fn code(self) -> i32 {
        match self {
            SdkErrorCode::Success => 0,
            SdkErrorCode::Unknown => 40001,
            SdkErrorCode::RequestFailed => 40010,
        }
    }

    /// Caller-facing message paired with this code.
    pub fn message(self) -> &'static str {
        match self {
            SdkErrorCode::Success => "Success.",
            SdkErrorCode::Unknown => "An unknown error occurred.",
            SdkErrorCode::RequestFailed => "Request failed.",
        }
    }

    /// The uniform error body for this code.
    pub fn to_response(self) -> ErrorResponse {
        ErrorResponse::new(self.message(), self)
    }
}

/// Errors surfaced by the agent's HTTP layer.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Protection`] → 500
/// - [`ServiceError::Upstream`] → 502
/// - [`ServiceError::Unavailable`] → 503
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request body could not be used (undecodable nonce, invalid profile).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The attribute pipeline failed. Carries the already-flattened body.
    #[error("attribute protection failed: {}", .0.error)]
    Protection(ErrorResponse),

    /// The enrollment server rejected the exchange or could not be reached.
    #[error("upstream failure: {}", .0.error)]
    Upstream(ErrorResponse),

    /// No secure enrollment profile has been installed yet.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Protection(_) => 500,
            ServiceError::Upstream(_) => 502,
            ServiceError::Unavailable(_) => 503,
        }
    }

    /// Body returned to the caller.
    ///
    /// Bad requests and unavailability are reported with the generic
    /// [`SdkErrorCode::Unknown`] code so that no path leaks more detail than the
    /// pipeline itself does.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            ServiceError::Protection(body) | ServiceError::Upstream(body) => body.clone(),
            ServiceError::BadRequest(_) | ServiceError::Unavailable(_) => {
                SdkErrorCode::Unknown.to_response()
            }
        }
    }
}
