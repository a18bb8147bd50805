//! Axum request handlers for all agent endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::{
    AssertionRequest, AssertionResponse, AttributeSigningResponse, AttributesRequest,
    HealthResponse,
};
use common::{ErrorResponse, SdkErrorCode, SecureEnrollmentProfile, ServiceError};
use tracing::{info, warn};

use super::state::AppState;

/// Which signing variant a request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Standard,
    Mutable,
}

/// `POST /v1/attributes`: Protect and sign key attributes.
pub async fn add_attributes(
    State(state): State<AppState>,
    body: Result<Json<AttributesRequest>, JsonRejection>,
) -> Response {
    respond(sign(&state, body, Variant::Standard).await)
}

/// `POST /v1/attributes/mutable`: Same as `/v1/attributes`, with the key
/// reference namespaced for mutable attributes.
pub async fn add_mutable_attributes(
    State(state): State<AppState>,
    body: Result<Json<AttributesRequest>, JsonRejection>,
) -> Response {
    respond(sign(&state, body, Variant::Mutable).await)
}

async fn sign(
    state: &AppState,
    body: Result<Json<AttributesRequest>, JsonRejection>,
    variant: Variant,
) -> Result<AttributeSigningResponse, ServiceError> {
    let Json(req) = body.map_err(|e| ServiceError::BadRequest(e.body_text()))?;

    // Checked before the profile so callers learn about their own mistakes first.
    let nonce = STANDARD
        .decode(&req.nonce)
        .map_err(|_| ServiceError::BadRequest("nonce is not valid base64".into()))?;

    let sep = state
        .profile_store
        .current()
        .await
        .map_err(|e| ServiceError::Unavailable(e.to_string()))?;

    let attributes = req.attributes.as_ref();
    let signed = match variant {
        Variant::Standard => {
            state
                .protector
                .add_attributes(attributes, &req.key_ref, &sep, &nonce, &req.conversation_id)
                .await
        }
        Variant::Mutable => {
            state
                .protector
                .add_mutable_attributes(attributes, &req.key_ref, &sep, &nonce, &req.conversation_id)
                .await
        }
    };
    signed.map_err(ServiceError::Protection)
}

fn respond(result: Result<AttributeSigningResponse, ServiceError>) -> Response {
    match result {
        Ok(signed) => (StatusCode::OK, Json(signed)).into_response(),
        Err(e) => error_response(e),
    }
}

/// `PUT /v1/profile`: Install or replace the secure enrollment profile.
pub async fn put_profile(
    State(state): State<AppState>,
    body: Result<Json<SecureEnrollmentProfile>, JsonRejection>,
) -> Response {
    let sep = match body {
        Ok(Json(sep)) => sep,
        Err(e) => return error_response(ServiceError::BadRequest(e.body_text())),
    };
    let device_id = sep.device_id.clone();
    match state.profile_store.store(sep).await {
        Ok(()) => {
            info!(device_id = ?device_id, "secure enrollment profile installed");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(ServiceError::BadRequest(e.to_string())),
    }
}

/// `POST /v1/enrollment/assertion`: Exchange a SAML assertion with the
/// enrollment server.
pub async fn enrollment_assertion(
    State(state): State<AppState>,
    body: Result<Json<AssertionRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => return error_response(ServiceError::BadRequest(e.body_text())),
    };
    match state
        .enrollment
        .get_ionic_assertion(&req.enrollment_url, &req.saml_assertion_xml)
        .await
    {
        Ok(assertion) => {
            (StatusCode::OK, Json(AssertionResponse::success(assertion))).into_response()
        }
        Err(body) => error_response(ServiceError::Upstream(body)),
    }
}

/// `GET /health`: Liveness and readiness check.
///
/// Returns `200 OK` when a profile is installed, `503 Service Unavailable`
/// otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let profile_ready = state.profile_store.is_ready().await;

    let (status_code, status_str) = if profile_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        profile_ready,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new(
        "the requested resource does not exist",
        SdkErrorCode::Unknown,
    );
    (StatusCode::NOT_FOUND, Json(err))
}

/// Log `err` locally and turn it into its uniform response.
fn error_response(err: ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warn!(status = status.as_u16(), error = %err, "request failed");
    (status, Json(err.to_response())).into_response()
}
