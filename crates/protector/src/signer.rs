//! Signature over the attribute digest, bound to a conversation and key request.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::crypto::{CipherKey, CryptoProvider, DIGEST_LEN};
use crate::error::PipelineError;

/// Marker prepended to the key reference by the mutable variant.
pub const MUTABLE_PREFIX: &str = "mutable:";

/// Namespace a key reference for mutable attribute signing.
pub fn mutable_key_ref(key_ref: &str) -> String {
    format!("{MUTABLE_PREFIX}{key_ref}")
}

/// Additional authenticated data for the signature: `conversation_id:key_ref`.
pub fn signature_aad(conversation_id: &str, key_ref: &str) -> String {
    format!("{conversation_id}:{key_ref}")
}

/// Encrypt `digest` under `key` with the caller's nonce as IV.
///
/// Returns `base64(nonce ‖ ciphertext ‖ tag)`.
///
/// # Errors
///
/// Returns [`PipelineError::Encryption`] if the nonce is the wrong length or
/// the encryption fails.
pub async fn sign<P>(
    provider: &P,
    key: &CipherKey,
    digest: &[u8; DIGEST_LEN],
    nonce: &[u8],
    conversation_id: &str,
    key_ref: &str,
) -> Result<String, PipelineError>
where
    P: CryptoProvider + ?Sized,
{
    let aad = signature_aad(conversation_id, key_ref);
    let ciphertext = provider
        .encrypt(key, nonce, digest, aad.as_bytes())
        .await
        .map_err(PipelineError::Encryption)?;

    let mut sig = Vec::with_capacity(nonce.len() + ciphertext.len());
    sig.extend_from_slice(nonce);
    sig.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(sig))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CryptoError, RustCryptoProvider, IV_LEN, TAG_LEN};

    #[test]
    fn aad_is_colon_joined() {
        assert_eq!(signature_aad("c1", "kr1"), "c1:kr1");
        assert_eq!(signature_aad("c1", &mutable_key_ref("kr1")), "c1:mutable:kr1");
    }

    #[tokio::test]
    async fn signature_layout() {
        let key = CipherKey::import(&[3u8; 32]).unwrap();
        let nonce = [5u8; IV_LEN];
        let sig = sign(&RustCryptoProvider, &key, &[0u8; DIGEST_LEN], &nonce, "c1", "kr1")
            .await
            .unwrap();
        let raw = STANDARD.decode(sig).unwrap();
        assert_eq!(raw.len(), IV_LEN + DIGEST_LEN + TAG_LEN);
        assert_eq!(&raw[..IV_LEN], &nonce);
    }

    #[tokio::test]
    async fn short_nonce_is_an_encryption_error() {
        let key = CipherKey::import(&[3u8; 16]).unwrap();
        let err = sign(&RustCryptoProvider, &key, &[0u8; DIGEST_LEN], &[0u8; 8], "c", "k")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Encryption(CryptoError::InvalidIvLength(8))
        ));
    }
}
