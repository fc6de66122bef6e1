//! Password verifier hashes.
//!
//! An independent Argon2id hash of the password, checked before any attempt
//! to unwrap the vault key. The wrap envelope's AEAD tag remains the real
//! gate; the verifier only produces an explicit wrong-password signal
//! without touching key material. It uses its own salt and the same work
//! factor as the wrap path, so guessing against the verifier is never
//! cheaper than guessing against the envelope.

use crate::error::CryptoResult;
use crate::key::{derive_key, KdfParams, Salt};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Stored Argon2id verifier hash for the password factor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verifier {
    pub hash: Vec<u8>,
}

/// Computes the verifier hash for a password.
///
/// `salt` must be the dedicated verifier salt, never the key-derivation
/// salt: the verifier hash is persisted, and deriving it from the same salt
/// would persist the wrapping key itself.
pub fn make_verifier(password: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<Verifier> {
    let derived = derive_key(password, salt, params)?;
    Ok(Verifier {
        hash: derived.as_bytes().to_vec(),
    })
}

/// Checks a password against a stored verifier in constant time.
pub fn check_verifier(
    password: &str,
    salt: &Salt,
    params: &KdfParams,
    verifier: &Verifier,
) -> CryptoResult<bool> {
    let candidate = make_verifier(password, salt, params)?;
    Ok(bool::from(
        candidate.hash.as_slice().ct_eq(verifier.hash.as_slice()),
    ))
}
