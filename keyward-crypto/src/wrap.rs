//! Factor-tagged wrapping of the vault key.
//!
//! The raw vault key is sealed under a key derived from each enrolled
//! authentication factor. Each envelope binds its factor kind into the AEAD
//! associated data: an envelope created for one factor cannot be opened as
//! another, even by a caller holding the right wrapping key.

use crate::cipher::{open_with_aad, seal_with_aad, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, KEY_SIZE};
use serde::{Deserialize, Serialize};

/// Authentication factor a wrap envelope belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorTag {
    Password,
    Recovery,
    Biometry,
}

impl FactorTag {
    /// Domain-separation bytes mixed into the AEAD associated data.
    pub fn aad(&self) -> &'static [u8] {
        match self {
            FactorTag::Password => b"keyward-wrap-password-v1",
            FactorTag::Recovery => b"keyward-wrap-recovery-v1",
            FactorTag::Biometry => b"keyward-wrap-biometry-v1",
        }
    }
}

impl std::fmt::Display for FactorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorTag::Password => write!(f, "password"),
            FactorTag::Recovery => write!(f, "recovery"),
            FactorTag::Biometry => write!(f, "biometry"),
        }
    }
}

/// The vault key sealed under one factor's wrapping key.
///
/// The `factor` field is descriptive metadata for storage and debugging;
/// authentication comes from the associated data supplied at unwrap time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapEnvelope {
    pub factor: FactorTag,
    pub sealed_key: EncryptedData,
}

/// Wraps raw key material under `wrapping`, bound to `factor`.
pub fn wrap_key(
    raw: &DerivedKey,
    wrapping: &DerivedKey,
    factor: FactorTag,
) -> CryptoResult<WrapEnvelope> {
    let sealed_key = seal_with_aad(wrapping, raw.as_bytes(), factor.aad())?;
    Ok(WrapEnvelope { factor, sealed_key })
}

/// Unwraps an envelope the caller expects to belong to `factor`.
///
/// Fails if the wrapping key is wrong, the envelope was created for a
/// different factor, or the sealed payload is not exactly one key.
pub fn unwrap_key(
    envelope: &WrapEnvelope,
    wrapping: &DerivedKey,
    factor: FactorTag,
) -> CryptoResult<DerivedKey> {
    let plaintext = open_with_aad(wrapping, &envelope.sealed_key, factor.aad())?;

    if plaintext.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: plaintext.len(),
        });
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&plaintext);
    Ok(DerivedKey::from_bytes(bytes))
}
