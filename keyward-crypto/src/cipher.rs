//! ChaCha20-Poly1305 authenticated encryption.
//!
//! Every seal draws a fresh random 96-bit nonce, so the same key can seal
//! any number of payloads. Opening fails closed: a wrong key, tampered
//! ciphertext, or mismatched associated data all surface as
//! [`CryptoError::Decryption`] with no partial plaintext.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use serde::{Deserialize, Serialize};

/// Nonce length in bytes (96-bit, per RFC 8439).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Ciphertext plus the nonce it was sealed with.
///
/// The Poly1305 tag is appended to the ciphertext. The nonce is random per
/// seal and safe to store in the clear.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Seals plaintext under `key` with a fresh random nonce.
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    seal_with_aad(key, plaintext, &[])
}

/// Seals plaintext with associated data bound into the authentication tag.
///
/// The associated data is not stored; the caller must present the same
/// bytes to [`open_with_aad`] or the tag check fails.
pub fn seal_with_aad(
    key: &DerivedKey,
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::Encryption("AEAD seal failed".to_string()))?;

    Ok(EncryptedData {
        nonce: nonce.into(),
        ciphertext,
    })
}

/// Opens sealed data. Fails if the key is wrong or the data was tampered with.
pub fn open(key: &DerivedKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    open_with_aad(key, data, &[])
}

/// Opens sealed data, authenticating the given associated data as well.
pub fn open_with_aad(key: &DerivedKey, data: &EncryptedData, aad: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(
            Nonce::from_slice(&data.nonce),
            Payload {
                msg: &data.ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Decryption("wrong key or tampered data".to_string()))
}

/// Seals plaintext and encodes `nonce || ciphertext` as a base64 string.
///
/// The inverse of [`open_from_string`]. Used where a sealed payload must
/// travel as opaque text, e.g. the remote backup document.
pub fn seal_to_string(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<String> {
    let data = seal(key, plaintext)?;
    let mut combined = Vec::with_capacity(NONCE_SIZE + data.ciphertext.len());
    combined.extend_from_slice(&data.nonce);
    combined.extend_from_slice(&data.ciphertext);
    Ok(STANDARD.encode(combined))
}

/// Decodes and opens a base64 `nonce || ciphertext` blob produced by
/// [`seal_to_string`].
pub fn open_from_string(key: &DerivedKey, blob: &str) -> CryptoResult<Vec<u8>> {
    let combined = STANDARD
        .decode(blob)
        .map_err(|e| CryptoError::InvalidEncoding(format!("invalid base64: {e}")))?;

    if combined.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidEncoding(format!(
            "sealed blob too short: {} bytes",
            combined.len()
        )));
    }

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&combined[..NONCE_SIZE]);
    let data = EncryptedData {
        nonce,
        ciphertext: combined[NONCE_SIZE..].to_vec(),
    };
    open(key, &data)
}
