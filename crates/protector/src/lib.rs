//! Selective encryption and signing of key attributes.
//!
//! Given a key-attribute mapping, a key reference, a secure enrollment profile,
//! a caller nonce and a conversation ID, [`AttributeProtector`] produces
//! `{ attrs, sig }`:
//!
//! 1. Import the profile's AES key ([`key_import`]).
//! 2. Encrypt every protected attribute under a fresh IV with its name as AAD
//!    ([`attributes`]).
//! 3. Serialise the result once and hash those bytes ([`canonical`]).
//! 4. Encrypt the digest under the caller nonce with
//!    `conversation_id:key_ref` as AAD ([`signer`]).
//!
//! All failures leave the public API as one uniform `UNKNOWN` error.
//!
//! # Security invariants
//!
//! - No IV is used twice; the signature uses the caller nonce, never an
//!   attribute IV.
//! - `attrs` is exactly the string that was hashed.
//! - Raw key bytes, plaintext protected values and nonces never reach a log field.

pub mod attributes;
pub mod canonical;
pub mod crypto;
pub mod enrollment;
pub mod error;
pub mod key_import;
pub mod pipeline;
pub mod signer;
pub mod verify;

pub use crypto::{CipherKey, CryptoError, CryptoProvider, RustCryptoProvider};
pub use enrollment::EnrollmentClient;
pub use error::PipelineError;
pub use pipeline::{AttributeProtector, Stage};
pub use signer::MUTABLE_PREFIX;
