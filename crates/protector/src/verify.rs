//! Receiving side of the bundle: open protected values and check signatures.
//!
//! A key server holding the same AES key uses these to recover protected
//! attribute values and to confirm that `attrs` was signed for the expected
//! conversation and key reference.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::AttributeSigningResponse;
use serde_json::Value;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::crypto::{CipherKey, CryptoProvider, IV_LEN, TAG_LEN};
use crate::signer::signature_aad;

/// Why a bundle or protected value failed verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// Not base64, too short, or not JSON after decryption.
    #[error("malformed input: {0}")]
    Malformed(&'static str),

    /// AES-GCM authentication failed: wrong key, wrong AAD, or tampering.
    #[error("authentication failed")]
    Authentication,

    /// The signature decrypted but does not match SHA-256 of `attrs`.
    #[error("digest mismatch")]
    DigestMismatch,
}

/// Split `base64(IV ‖ ciphertext ‖ tag)` into IV and the rest.
fn split_sealed(encoded: &str) -> Result<(Vec<u8>, Vec<u8>), VerifyError> {
    let mut raw = STANDARD
        .decode(encoded)
        .map_err(|_| VerifyError::Malformed("not base64"))?;
    if raw.len() < IV_LEN + TAG_LEN {
        return Err(VerifyError::Malformed("shorter than IV and tag"));
    }
    let rest = raw.split_off(IV_LEN);
    Ok((raw, rest))
}

/// Decrypt the protected attribute `name` and parse its JSON value.
///
/// # Errors
///
/// Returns [`VerifyError::Authentication`] if `name` is not the attribute the
/// value was sealed under.
pub async fn open_protected<P>(
    provider: &P,
    key: &CipherKey,
    name: &str,
    sealed: &str,
) -> Result<Value, VerifyError>
where
    P: CryptoProvider + ?Sized,
{
    let (iv, ciphertext) = split_sealed(sealed)?;
    let plaintext = provider
        .decrypt(key, &iv, &ciphertext, name.as_bytes())
        .await
        .map_err(|_| VerifyError::Authentication)?;
    serde_json::from_slice(&plaintext).map_err(|_| VerifyError::Malformed("value is not JSON"))
}

/// Check that `bundle.sig` signs `bundle.attrs` for `conversation_id:key_ref`.
///
/// # Errors
///
/// Returns [`VerifyError::Authentication`] when the signature was made for a
/// different conversation or key reference, and [`VerifyError::DigestMismatch`]
/// when `attrs` differs from what was signed.
pub async fn verify_signature<P>(
    provider: &P,
    key: &CipherKey,
    bundle: &AttributeSigningResponse,
    conversation_id: &str,
    key_ref: &str,
) -> Result<(), VerifyError>
where
    P: CryptoProvider + ?Sized,
{
    let (nonce, ciphertext) = split_sealed(&bundle.sig)?;
    let aad = signature_aad(conversation_id, key_ref);
    let signed = provider
        .decrypt(key, &nonce, &ciphertext, aad.as_bytes())
        .await
        .map_err(|_| VerifyError::Authentication)?;
    let expected = provider
        .digest(bundle.attrs.as_bytes())
        .await
        .map_err(|_| VerifyError::Malformed("digest failed"))?;

    if bool::from(signed.ct_eq(&expected)) {
        Ok(())
    } else {
        Err(VerifyError::DigestMismatch)
    }
}
