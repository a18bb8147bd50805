//! Cryptographic capability consumed by the attribute pipeline.
//!
//! The pipeline never touches a cipher, hash or RNG directly. It is handed a
//! [`CryptoProvider`] so that tests can substitute failing or deterministic
//! implementations.
//!
//! # Parameters
//!
//! ```text
//! AES-GCM, 128/192/256-bit key, 16-byte IV, 16-byte tag, SHA-256 digest
//! ```

pub mod cipher;

use async_trait::async_trait;
use thiserror::Error;

pub use cipher::{CipherKey, RustCryptoProvider};

/// Byte length of every IV and signature nonce.
pub const IV_LEN: usize = 16;

/// Byte length of the AES-GCM authentication tag appended to ciphertexts.
pub const TAG_LEN: usize = 16;

/// Byte length of a SHA-256 digest.
pub const DIGEST_LEN: usize = 32;

/// Errors produced by the crypto layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Raw key material is not 16, 24 or 32 bytes.
    #[error("invalid AES key length: {0} bytes")]
    InvalidKeyLength(usize),

    /// The IV is not [`IV_LEN`] bytes.
    #[error("invalid IV length: expected {IV_LEN} bytes, got {0}")]
    InvalidIvLength(usize),

    /// AES-GCM encryption or decryption failed.
    #[error("aead operation failed")]
    AeadFailure,

    /// The random source could not produce bytes.
    #[error("random source failure")]
    RandomFailure,
}

/// Import, encrypt, digest and random-number operations used by the pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    /// Materialise a non-extractable AES-GCM key from raw bytes.
    async fn import_key(&self, raw: &[u8]) -> Result<CipherKey, CryptoError>;

    /// Encrypt `plaintext`, returning `ciphertext ‖ tag`.
    async fn encrypt(
        &self,
        key: &CipherKey,
        iv: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt `ciphertext ‖ tag`, failing if authentication does not hold.
    async fn decrypt(
        &self,
        key: &CipherKey,
        iv: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// SHA-256 of `data`.
    async fn digest(&self, data: &[u8]) -> Result<[u8; DIGEST_LEN], CryptoError>;

    /// `len` bytes from a cryptographically secure source.
    async fn random_bytes(&self, len: usize) -> Result<Vec<u8>, CryptoError>;
}
