//! Secure enrollment profile and enrollment assertion types.

use serde::{Deserialize, Serialize};

/// Caller-held profile carrying the session key material obtained via enrollment.
///
/// Only `ka_aes_key` is consumed by the attribute pipeline.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureEnrollmentProfile {
    /// Hex-encoded raw AES key shared with the key appliance.
    pub ka_aes_key: String,
    /// Device identifier assigned at enrollment.
    #[serde(default, rename = "deviceId", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Base URL of the key server this profile was enrolled against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl SecureEnrollmentProfile {
    /// Profile holding only a key, as used by the pipeline.
    pub fn from_key_hex(ka_aes_key: impl Into<String>) -> Self {
        Self {
            ka_aes_key: ka_aes_key.into(),
            device_id: None,
            server: None,
        }
    }
}

impl std::fmt::Debug for SecureEnrollmentProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureEnrollmentProfile")
            .field("ka_aes_key", &"[REDACTED]")
            .field("device_id", &self.device_id)
            .field("server", &self.server)
            .finish()
    }
}

/// Header values returned by the enrollment server for a SAML assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IonicAssertion {
    /// Signed, optionally encrypted token describing the user identity.
    #[serde(rename = "X-Ionic-Reg-Uidauth")]
    pub uidauth: Option<String>,
    /// Extra authentication factor issued by the enrollment portal.
    #[serde(rename = "X-Ionic-Reg-Stoken")]
    pub stoken: Option<String>,
    /// Scheme, host and optional port of the API servers to enroll against.
    #[serde(rename = "X-Ionic-Reg-Ionic-API-Urls")]
    pub api_urls: Option<String>,
    /// Identifier of the key server set being enrolled into.
    #[serde(rename = "X-Ionic-Reg-Enrollment-Tag")]
    pub enrollment_tag: Option<String>,
    /// Public key used to wrap the enrollment package.
    #[serde(rename = "X-Ionic-Reg-Pubkey")]
    pub pubkey: Option<String>,
}

impl IonicAssertion {
    /// Header names read from the enrollment response, in field order.
    pub const HEADERS: [&'static str; 5] = [
        "X-Ionic-Reg-Uidauth",
        "X-Ionic-Reg-Stoken",
        "X-Ionic-Reg-Ionic-API-Urls",
        "X-Ionic-Reg-Enrollment-Tag",
        "X-Ionic-Reg-Pubkey",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_debug_redacts_key() {
        let sep = SecureEnrollmentProfile::from_key_hex("00112233445566778899aabbccddeeff");
        let dbg = format!("{sep:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("00112233"));
    }

    #[test]
    fn profile_accepts_extra_fields() {
        let sep: SecureEnrollmentProfile = serde_json::from_value(json!({
            "ka_aes_key": "00",
            "deviceId": "ABcd.1.dev",
            "server": "https://api.example.com",
            "creationTimestamp": 1
        }))
        .unwrap();
        assert_eq!(sep.device_id.as_deref(), Some("ABcd.1.dev"));
    }

    #[test]
    fn assertion_serialises_with_header_names() {
        let a = IonicAssertion {
            enrollment_tag: Some("tag".into()),
            ..Default::default()
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["X-Ionic-Reg-Enrollment-Tag"], "tag");
        assert!(v["X-Ionic-Reg-Pubkey"].is_null());
    }
}
