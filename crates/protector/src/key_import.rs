//! Key import: hex `ka_aes_key` → [`CipherKey`].

use common::SecureEnrollmentProfile;
use zeroize::Zeroizing;

use crate::crypto::{CipherKey, CryptoProvider};
use crate::error::PipelineError;

/// Decode the profile's key and import it through `provider`.
///
/// The decoded bytes live in a zeroizing buffer that is wiped as soon as the
/// import returns.
///
/// # Errors
///
/// Returns [`PipelineError::KeyImport`] if the key is not hex or is not a
/// valid AES key length.
pub async fn import_profile_key<P>(
    provider: &P,
    sep: &SecureEnrollmentProfile,
) -> Result<CipherKey, PipelineError>
where
    P: CryptoProvider + ?Sized,
{
    // The hex error names the offending character; keep it out of the message.
    let raw = Zeroizing::new(
        hex::decode(&sep.ka_aes_key)
            .map_err(|_| PipelineError::KeyImport("ka_aes_key is not valid hex".into()))?,
    );
    provider
        .import_key(&raw)
        .await
        .map_err(|e| PipelineError::KeyImport(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RustCryptoProvider;

    #[tokio::test]
    async fn imports_256_bit_key() {
        let sep = SecureEnrollmentProfile::from_key_hex("11".repeat(32));
        let key = import_profile_key(&RustCryptoProvider, &sep).await.unwrap();
        assert_eq!(key.bits(), 256);
    }

    #[tokio::test]
    async fn rejects_non_hex() {
        let sep = SecureEnrollmentProfile::from_key_hex("zz".repeat(16));
        let err = import_profile_key(&RustCryptoProvider, &sep).await.unwrap_err();
        assert!(matches!(err, PipelineError::KeyImport(_)));
    }

    #[tokio::test]
    async fn rejects_wrong_length() {
        let sep = SecureEnrollmentProfile::from_key_hex("11".repeat(20));
        let err = import_profile_key(&RustCryptoProvider, &sep).await.unwrap_err();
        assert!(matches!(err, PipelineError::KeyImport(_)));
    }

    #[tokio::test]
    async fn rejects_empty_key() {
        let sep = SecureEnrollmentProfile::from_key_hex("");
        assert!(import_profile_key(&RustCryptoProvider, &sep).await.is_err());
    }
}
