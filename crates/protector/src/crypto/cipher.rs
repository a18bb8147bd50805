//! AES-GCM with 16-byte IVs, backed by the RustCrypto crates.
//!
//! **IV length:** every IV and nonce handled here is 16 bytes, so GCM derives
//! its counter block through GHASH rather than using the 96-bit fast path.
//! Both sides of the exchange must agree on this; do not shorten it to 12.
//!
//! **IV reuse:** GCM is not misuse-resistant. Reusing an IV under the same key
//! breaks both confidentiality and authentication, so IVs always come from
//! [`CryptoProvider::random_bytes`] or from a caller-supplied fresh nonce.

use aes_gcm::{
    aead::{consts::U16, rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    aes::{Aes128, Aes192, Aes256},
    AesGcm, Nonce,
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{CryptoError, CryptoProvider, DIGEST_LEN, IV_LEN};

type Aes128Gcm16 = AesGcm<Aes128, U16>;
type Aes192Gcm16 = AesGcm<Aes192, U16>;
type Aes256Gcm16 = AesGcm<Aes256, U16>;

enum KeySchedule {
    Aes128(Aes128Gcm16),
    Aes192(Aes192Gcm16),
    Aes256(Aes256Gcm16),
}

/// An imported AES-GCM key.
///
/// Only the expanded key schedule is held; the raw bytes it was built from are
/// not retained and cannot be read back out.
pub struct CipherKey {
    inner: KeySchedule,
}

impl CipherKey {
    /// Build a key from 16, 24 or 32 raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] for any other length.
    pub fn import(raw: &[u8]) -> Result<Self, CryptoError> {
        let bad_len = |_| CryptoError::InvalidKeyLength(raw.len());
        let inner = match raw.len() {
            16 => KeySchedule::Aes128(Aes128Gcm16::new_from_slice(raw).map_err(bad_len)?),
            24 => KeySchedule::Aes192(Aes192Gcm16::new_from_slice(raw).map_err(bad_len)?),
            32 => KeySchedule::Aes256(Aes256Gcm16::new_from_slice(raw).map_err(bad_len)?),
            n => return Err(CryptoError::InvalidKeyLength(n)),
        };
        Ok(Self { inner })
    }

    /// Key size in bits.
    pub fn bits(&self) -> usize {
        match self.inner {
            KeySchedule::Aes128(_) => 128,
            KeySchedule::Aes192(_) => 192,
            KeySchedule::Aes256(_) => 256,
        }
    }

    fn seal(&self, iv: &[u8], msg: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = nonce_from(iv)?;
        let payload = Payload { msg, aad };
        match &self.inner {
            KeySchedule::Aes128(c) => c.encrypt(nonce, payload),
            KeySchedule::Aes192(c) => c.encrypt(nonce, payload),
            KeySchedule::Aes256(c) => c.encrypt(nonce, payload),
        }
        .map_err(|_| CryptoError::AeadFailure)
    }

    fn open(&self, iv: &[u8], msg: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = nonce_from(iv)?;
        let payload = Payload { msg, aad };
        match &self.inner {
            KeySchedule::Aes128(c) => c.decrypt(nonce, payload),
            KeySchedule::Aes192(c) => c.decrypt(nonce, payload),
            KeySchedule::Aes256(c) => c.decrypt(nonce, payload),
        }
        .map_err(|_| CryptoError::AeadFailure)
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        write!(f, "CipherKey(AES-{}-GCM, [REDACTED])", self.bits())
    }
}

fn nonce_from(iv: &[u8]) -> Result<&Nonce<U16>, CryptoError> {
    if iv.len() != IV_LEN {
        return Err(CryptoError::InvalidIvLength(iv.len()));
    }
    Ok(Nonce::<U16>::from_slice(iv))
}

/// Production [`CryptoProvider`]: `aes-gcm`, `sha2` and the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

#[async_trait]
impl CryptoProvider for RustCryptoProvider {
    async fn import_key(&self, raw: &[u8]) -> Result<CipherKey, CryptoError> {
        CipherKey::import(raw)
    }

    async fn encrypt(
        &self,
        key: &CipherKey,
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        key.seal(iv, plaintext, aad)
    }

    async fn decrypt(
        &self,
        key: &CipherKey,
        iv: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        key.open(iv, ciphertext, aad)
    }

    async fn digest(&self, data: &[u8]) -> Result<[u8; DIGEST_LEN], CryptoError> {
        Ok(Sha256::digest(data).into())
    }

    async fn random_bytes(&self, len: usize) -> Result<Vec<u8>, CryptoError> {
        let mut buf = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|_| CryptoError::RandomFailure)?;
        Ok(buf)
    }
}
