//! The attribute protector: key import → IVs → encryption → serialisation →
//! hash → signature.
//!
//! Each stage consumes the previous stage's output, so the pipeline is strictly
//! sequential and any failure short-circuits. Two layers are exposed:
//!
//! - [`AttributeProtector::protect`] returns the internal [`PipelineError`].
//! - [`AttributeProtector::add_attributes`] and
//!   [`AttributeProtector::add_mutable_attributes`] collapse every failure into
//!   the uniform `UNKNOWN` [`ErrorResponse`].

use common::{AttributeSigningResponse, ErrorResponse, SecureEnrollmentProfile};
use serde_json::Value;
use tracing::{debug, error};

use crate::attributes::{self, ProtectedSet};
use crate::canonical;
use crate::crypto::CryptoProvider;
use crate::error::PipelineError;
use crate::key_import::import_profile_key;
use crate::signer::{self, mutable_key_ref};

/// Pipeline progress, recorded on debug events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    KeyImported,
    IvsGenerated,
    AttributesEncrypted,
    Serialized,
    Hashed,
    Signed,
    Done,
}

/// Builds signed, selectively-encrypted attribute bundles.
///
/// Holds no state beyond its crypto provider; concurrent calls never interact.
#[derive(Debug, Clone, Default)]
pub struct AttributeProtector<P> {
    provider: P,
}

impl<P: CryptoProvider> AttributeProtector<P> {
    /// Create a protector over `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Protect `attributes` and sign them for `key_ref` within `conversation_id`.
    ///
    /// `nonce` must be 16 fresh random bytes.
    ///
    /// # Errors
    ///
    /// Every failure is returned as the same `UNKNOWN` [`ErrorResponse`].
    pub async fn add_attributes(
        &self,
        attributes: Option<&Value>,
        key_ref: &str,
        sep: &SecureEnrollmentProfile,
        nonce: &[u8],
        conversation_id: &str,
    ) -> Result<AttributeSigningResponse, ErrorResponse> {
        self.protect(attributes, key_ref, sep, nonce, conversation_id)
            .await
            .map_err(|e| {
                error!(
                    kind = e.kind(),
                    error = %e,
                    "unexpected error occurred while building signed attributes object"
                );
                ErrorResponse::from(e)
            })
    }

    /// As [`AttributeProtector::add_attributes`], with the key reference
    /// namespaced by [`signer::MUTABLE_PREFIX`] before it is bound into the
    /// signature.
    ///
    /// # Errors
    ///
    /// Every failure is returned as the same `UNKNOWN` [`ErrorResponse`].
    pub async fn add_mutable_attributes(
        &self,
        attributes: Option<&Value>,
        key_ref: &str,
        sep: &SecureEnrollmentProfile,
        nonce: &[u8],
        conversation_id: &str,
    ) -> Result<AttributeSigningResponse, ErrorResponse> {
        self.add_attributes(
            attributes,
            &mutable_key_ref(key_ref),
            sep,
            nonce,
            conversation_id,
        )
        .await
    }

    /// Run the pipeline, keeping the failure cause.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidAttributes`] before any cryptographic
    /// work if `attributes` is not absent, `null` or an object; otherwise the
    /// error of the first stage that fails.
    pub async fn protect(
        &self,
        attributes: Option<&Value>,
        key_ref: &str,
        sep: &SecureEnrollmentProfile,
        nonce: &[u8],
        conversation_id: &str,
    ) -> Result<AttributeSigningResponse, PipelineError> {
        let provider = &self.provider;
        debug!(stage = ?Stage::Start, "building signed attributes");
        let attrs = attributes::normalize(attributes)?;

        let key = import_profile_key(provider, sep).await?;
        debug!(stage = ?Stage::KeyImported, key_bits = key.bits());

        let protected = ProtectedSet::collect(&attrs);
        let ivs = attributes::generate_ivs(provider, &protected).await?;
        debug!(stage = ?Stage::IvsGenerated, protected = protected.len());

        let sealed = attributes::seal_all(provider, &key, &protected, &ivs).await?;
        let assembled = attributes::substitute(&attrs, sealed);
        debug!(stage = ?Stage::AttributesEncrypted, total = assembled.len());

        let json = canonical::serialize(&assembled)?;
        debug!(stage = ?Stage::Serialized, bytes = json.len());

        let assembled = canonical::hash(provider, json).await?;
        debug!(stage = ?Stage::Hashed);

        let sig = signer::sign(
            provider,
            &key,
            assembled.digest(),
            nonce,
            conversation_id,
            key_ref,
        )
        .await?;
        debug!(stage = ?Stage::Signed);

        let response = AttributeSigningResponse {
            attrs: assembled.into_json(),
            sig,
        };
        debug!(stage = ?Stage::Done);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CipherKey, CryptoError, MockCryptoProvider, IV_LEN};
    use common::SdkErrorCode;
    use serde_json::json;

    fn sep() -> SecureEnrollmentProfile {
        SecureEnrollmentProfile::from_key_hex("ab".repeat(32))
    }

    fn importing_mock() -> MockCryptoProvider {
        let mut provider = MockCryptoProvider::new();
        provider
            .expect_import_key()
            .returning(|raw| CipherKey::import(raw));
        provider
    }

    #[tokio::test]
    async fn invalid_attributes_fail_before_key_import() {
        let mut provider = MockCryptoProvider::new();
        provider.expect_import_key().never();
        provider.expect_random_bytes().never();
        let protector = AttributeProtector::new(provider);
        let err = protector
            .protect(Some(&json!(["a"])), "kr1", &sep(), &[0u8; IV_LEN], "c1")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidAttributes(_)));
    }

    #[tokio::test]
    async fn encryption_failure_is_flattened() {
        let mut provider = importing_mock();
        provider
            .expect_random_bytes()
            .returning(|len| Ok(vec![1u8; len]));
        provider
            .expect_encrypt()
            .returning(|_, _, _, _| Err(CryptoError::AeadFailure));
        let protector = AttributeProtector::new(provider);
        let attrs = json!({"ionic-protected-dept": "finance"});

        let resp = protector
            .add_attributes(Some(&attrs), "kr1", &sep(), &[0u8; IV_LEN], "c1")
            .await
            .unwrap_err();
        assert_eq!(resp, SdkErrorCode::Unknown.to_response());
    }

    #[tokio::test]
    async fn digest_failure_is_unknown_kind() {
        let mut provider = importing_mock();
        provider
            .expect_digest()
            .returning(|_| Err(CryptoError::AeadFailure));
        let protector = AttributeProtector::new(provider);
        let err = protector
            .protect(Some(&json!({"owner": "alice"})), "kr1", &sep(), &[0u8; IV_LEN], "c1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unknown");
    }

    #[tokio::test]
    async fn key_import_failure_and_bad_input_look_identical() {
        let protector = AttributeProtector::new(crate::crypto::RustCryptoProvider);
        let bad_key = SecureEnrollmentProfile::from_key_hex("not-hex");
        let a = protector
            .add_attributes(None, "kr1", &bad_key, &[0u8; IV_LEN], "c1")
            .await
            .unwrap_err();
        let b = protector
            .add_attributes(Some(&json!(7)), "kr1", &sep(), &[0u8; IV_LEN], "c1")
            .await
            .unwrap_err();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn mutable_variant_binds_prefixed_key_ref() {
        let mut provider = importing_mock();
        provider
            .expect_digest()
            .returning(|_| Ok([0u8; crate::crypto::DIGEST_LEN]));
        provider
            .expect_encrypt()
            .withf(|_, _, _, aad| aad == b"c1:mutable:kr1".as_slice())
            .times(1)
            .returning(|_, _, pt, _| Ok(pt.to_vec()));
        let protector = AttributeProtector::new(provider);
        protector
            .add_mutable_attributes(None, "kr1", &sep(), &[0u8; IV_LEN], "c1")
            .await
            .unwrap();
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failure_logs_carry_no_secrets() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let key_hex = "5e".repeat(32);
        let nonce = b"nonce-too-short";
        let protector = AttributeProtector::new(crate::crypto::RustCryptoProvider);
        protector
            .add_attributes(
                Some(&json!({"ionic-protected-ssn": "123-45-6789", "owner": "alice"})),
                "kr1",
                &SecureEnrollmentProfile::from_key_hex(&key_hex),
                nonce,
                "c1",
            )
            .await
            .unwrap_err();

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("unexpected error occurred while building signed attributes object"));
        assert!(text.contains("AttributesEncrypted"));
        for secret in [key_hex.as_str(), "123-45-6789", "alice", "nonce-too-short"] {
            assert!(!text.contains(secret), "log output leaked {secret:?}");
        }
    }
}
