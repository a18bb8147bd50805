//! Attribute classification and the selective encryptor.
//!
//! An attribute is protected iff its name starts with [`PROTECTED_PREFIX`] or
//! equals [`INTEGRITY_HASH`]. Protected values are replaced with
//! `base64(IV ‖ ciphertext ‖ tag)`; everything else passes through untouched.
//!
//! The protected names are enumerated exactly once into a [`ProtectedSet`].
//! IVs, plaintexts and ciphertexts are all indexed against that list and the
//! results are matched back to attributes by name, never by a second walk of
//! the map.

use std::borrow::Cow;
use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::try_join_all;
use serde_json::{Map, Value};
use tracing::debug;

use crate::crypto::{CipherKey, CryptoProvider, IV_LEN};
use crate::error::PipelineError;

/// Name prefix marking an attribute as confidential.
pub const PROTECTED_PREFIX: &str = "ionic-protected-";

/// Reserved attribute name that is always treated as confidential.
pub const INTEGRITY_HASH: &str = "ionic-integrity-hash";

/// String-keyed attribute mapping in insertion order.
pub type AttributeMap = Map<String, Value>;

/// Returns `true` if `name` must be encrypted before transmission.
pub fn is_protected(name: &str) -> bool {
    name.starts_with(PROTECTED_PREFIX) || name == INTEGRITY_HASH
}

/// Accept the caller's attributes argument.
///
/// Absent and JSON `null` both become an empty map; a JSON object is borrowed
/// as is.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidAttributes`] for arrays and primitives.
pub fn normalize(attributes: Option<&Value>) -> Result<Cow<'_, AttributeMap>, PipelineError> {
    match attributes {
        None | Some(Value::Null) => Ok(Cow::Owned(AttributeMap::new())),
        Some(Value::Object(map)) => Ok(Cow::Borrowed(map)),
        Some(other) => Err(PipelineError::InvalidAttributes(format!(
            "expected a JSON object, got {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The protected attributes of one map, in insertion order.
#[derive(Debug)]
pub struct ProtectedSet<'a> {
    entries: Vec<(&'a str, &'a Value)>,
}

impl<'a> ProtectedSet<'a> {
    /// Collect every protected attribute of `attributes`.
    pub fn collect(attributes: &'a AttributeMap) -> Self {
        let entries: Vec<_> = attributes
            .iter()
            .filter(|(name, _)| is_protected(name))
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        if entries.iter().any(|(name, _)| *name == INTEGRITY_HASH) {
            debug!("caller supplied {INTEGRITY_HASH}; encrypting it as a protected attribute");
        }
        Self { entries }
    }

    /// Number of protected attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no attribute is protected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Protected names, in the order IVs are assigned.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

/// Draw one fresh IV per protected attribute.
///
/// The draws run concurrently; `try_join_all` returns them in request order,
/// so `ivs[i]` belongs to the `i`-th entry of `set`.
///
/// # Errors
///
/// Returns [`PipelineError::Unknown`] if the random source fails.
pub async fn generate_ivs<P>(
    provider: &P,
    set: &ProtectedSet<'_>,
) -> Result<Vec<Vec<u8>>, PipelineError>
where
    P: CryptoProvider + ?Sized,
{
    if set.is_empty() {
        return Ok(Vec::new());
    }
    try_join_all(set.entries.iter().map(|_| provider.random_bytes(IV_LEN)))
        .await
        .map_err(|e| PipelineError::Unknown(format!("IV generation failed: {e}")))
}

/// Encrypt every protected value with its own IV and its name as AAD.
///
/// Returns `(name, base64(IV ‖ ciphertext ‖ tag))` pairs in the order of `set`.
///
/// # Errors
///
/// Returns [`PipelineError::Serialization`] if a value cannot be serialised,
/// [`PipelineError::Encryption`] if any encryption fails, and
/// [`PipelineError::Unknown`] if the IV count does not match the set.
pub async fn seal_all<'a, P>(
    provider: &P,
    key: &CipherKey,
    set: &ProtectedSet<'a>,
    ivs: &[Vec<u8>],
) -> Result<Vec<(&'a str, String)>, PipelineError>
where
    P: CryptoProvider + ?Sized,
{
    if ivs.len() != set.len() {
        return Err(PipelineError::Unknown(format!(
            "{} IVs for {} protected attributes",
            ivs.len(),
            set.len()
        )));
    }

    let plaintexts = set
        .entries
        .iter()
        .map(|(_, value)| serde_json::to_vec(value))
        .collect::<Result<Vec<_>, _>>()
        .map_err(PipelineError::Serialization)?;

    let ciphertexts = try_join_all(
        set.entries
            .iter()
            .zip(ivs)
            .zip(&plaintexts)
            .map(|((&(name, _), iv), plaintext)| {
                provider.encrypt(key, iv, plaintext, name.as_bytes())
            }),
    )
    .await
    .map_err(PipelineError::Encryption)?;

    Ok(set
        .names()
        .zip(ivs)
        .zip(ciphertexts)
        .map(|((name, iv), ciphertext)| {
            let mut sealed = Vec::with_capacity(iv.len() + ciphertext.len());
            sealed.extend_from_slice(iv);
            sealed.extend_from_slice(&ciphertext);
            (name, STANDARD.encode(sealed))
        })
        .collect())
}

/// Rebuild the attribute map with sealed values substituted by name.
///
/// Insertion order of `attributes` is preserved; plaintext values are cloned
/// unchanged.
pub fn substitute(attributes: &AttributeMap, sealed: Vec<(&str, String)>) -> AttributeMap {
    let mut by_name: HashMap<&str, String> = sealed.into_iter().collect();
    attributes
        .iter()
        .map(|(name, value)| {
            let out = match by_name.remove(name.as_str()) {
                Some(encoded) => Value::String(encoded),
                None => value.clone(),
            };
            (name.clone(), out)
        })
        .collect()
}
