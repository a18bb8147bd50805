//! Enrollment exchange: trade a SAML assertion for enrollment header values.
//!
//! This is the first leg of enrollment. Its result feeds the handshake that
//! eventually yields the secure enrollment profile consumed by the pipeline.
//! No retries are attempted; the caller owns retry policy.

use std::time::Duration;

use common::{ErrorResponse, IonicAssertion, SdkErrorCode};
use reqwest::header::{HeaderMap, EXPECT};
use tracing::{info, warn};

/// HTTP client for the enrollment server.
#[derive(Debug, Clone)]
pub struct EnrollmentClient {
    http: reqwest::Client,
}

impl EnrollmentClient {
    /// Build a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("protector/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// POST `saml_assertion_xml` as the `SAMLResponse` form field to
    /// `enrollment_url` and collect the enrollment headers.
    ///
    /// # Errors
    ///
    /// - Non-2xx status → `UNKNOWN` with the status in the message.
    /// - Transport failure → `REQUEST_FAILED` with the cause in the message.
    pub async fn get_ionic_assertion(
        &self,
        enrollment_url: &str,
        saml_assertion_xml: &str,
    ) -> Result<IonicAssertion, ErrorResponse> {
        let response = self
            .http
            .post(enrollment_url)
            .header(EXPECT, "100-continue")
            .form(&[("SAMLResponse", saml_assertion_xml)])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "enrollment request failed");
                ErrorResponse::new(
                    format!("{} {}.", SdkErrorCode::RequestFailed.message(), e),
                    SdkErrorCode::RequestFailed,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "enrollment server rejected assertion");
            return Err(ErrorResponse::new(
                format!(
                    "Enrollment server responded with the status {}.",
                    status.as_u16()
                ),
                SdkErrorCode::Unknown,
            ));
        }

        info!("enrollment assertion received");
        Ok(assertion_from_headers(response.headers()))
    }
}

impl Default for EnrollmentClient {
    /// A client with reqwest's defaults and no request timeout.
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

fn assertion_from_headers(headers: &HeaderMap) -> IonicAssertion {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let [uidauth, stoken, api_urls, enrollment_tag, pubkey] = IonicAssertion::HEADERS;
    IonicAssertion {
        uidauth: get(uidauth),
        stoken: get(stoken),
        api_urls: get(api_urls),
        enrollment_tag: get(enrollment_tag),
        pubkey: get(pubkey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap as AxumHeaders, StatusCode},
        routing::post,
        Form, Router,
    };
    use std::collections::HashMap;

    async fn enroll(Form(form): Form<HashMap<String, String>>) -> (StatusCode, AxumHeaders) {
        let mut headers = AxumHeaders::new();
        if form.get("SAMLResponse").map(String::as_str) != Some("<samlp:Response/>") {
            return (StatusCode::FORBIDDEN, headers);
        }
        headers.insert("x-ionic-reg-stoken", "stoken-1".parse().unwrap());
        headers.insert("x-ionic-reg-enrollment-tag", "tag-1".parse().unwrap());
        headers.insert(
            "x-ionic-reg-ionic-api-urls",
            "https://api.example.com".parse().unwrap(),
        );
        (StatusCode::OK, headers)
    }

    async fn spawn_server() -> String {
        let app = Router::new().route("/enroll", post(enroll));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/enroll")
    }

    #[test]
    fn missing_headers_are_none() {
        let assertion = assertion_from_headers(&HeaderMap::new());
        assert_eq!(assertion, IonicAssertion::default());
    }

    #[tokio::test]
    async fn collects_enrollment_headers() {
        let url = spawn_server().await;
        let client = EnrollmentClient::new(Duration::from_secs(5)).unwrap();
        let assertion = client
            .get_ionic_assertion(&url, "<samlp:Response/>")
            .await
            .unwrap();
        assert_eq!(assertion.stoken.as_deref(), Some("stoken-1"));
        assert_eq!(assertion.enrollment_tag.as_deref(), Some("tag-1"));
        assert_eq!(assertion.api_urls.as_deref(), Some("https://api.example.com"));
        assert!(assertion.uidauth.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_unknown() {
        let url = spawn_server().await;
        let client = EnrollmentClient::new(Duration::from_secs(5)).unwrap();
        let err = client
            .get_ionic_assertion(&url, "<other/>")
            .await
            .unwrap_err();
        assert_eq!(err.sdk_response_code, SdkErrorCode::Unknown.code());
        assert_eq!(err.error, "Enrollment server responded with the status 403.");
    }

    #[tokio::test]
    async fn unreachable_server_is_request_failed() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = EnrollmentClient::new(Duration::from_secs(5)).unwrap();
        let err = client
            .get_ionic_assertion(&format!("http://{addr}/enroll"), "<x/>")
            .await
            .unwrap_err();
        assert_eq!(err.sdk_response_code, SdkErrorCode::RequestFailed.code());
        assert!(err.error.starts_with(SdkErrorCode::RequestFailed.message()));
    }
}
