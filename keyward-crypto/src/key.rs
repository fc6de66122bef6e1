//! Key derivation and key material types.
//!
//! Argon2id turns low-entropy factor secrets (passwords, recovery phrases,
//! device secrets) into 256-bit symmetric keys. One work-factor profile is
//! used for every derivation path, including the verifier hash, so no path
//! is cheaper to attack than another.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::OsRng;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key length in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// A 256-bit symmetric key. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Raw key bytes. Handle with care; never log or persist.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

// Never print key material, even at trace level.
impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DerivedKey(..)")
    }
}

/// Random salt for one derivation context. Never reused across contexts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt {
    bytes: [u8; SALT_SIZE],
}

impl Salt {
    /// Generates a fresh random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.bytes
    }
}

/// Argon2id work-factor parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes over memory.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub lanes: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // 64 MiB / 3 passes / 4 lanes
        Self {
            memory_kib: 65536,
            time_cost: 3,
            lanes: 4,
        }
    }
}

impl KdfParams {
    /// Minimal-cost parameters for tests. NOT safe for real secrets.
    pub fn fast_insecure() -> Self {
        Self {
            memory_kib: 16,
            time_cost: 1,
            lanes: 1,
        }
    }
}

/// Derives a 256-bit key from a secret string using Argon2id.
///
/// Deterministic: the same `(secret, salt, params)` always yields the same
/// key. Different salts yield unrelated keys for the same secret.
pub fn derive_key(secret: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    let argon_params = Params::new(params.memory_kib, params.time_cost, params.lanes, Some(KEY_SIZE))
        .map_err(|e| CryptoError::KeyDerivation(format!("invalid parameters: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut out = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(secret.as_bytes(), salt.as_bytes(), &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey::from_bytes(out))
}

/// Generates a random 256-bit key from the OS RNG.
///
/// Used for the vault key itself; derived keys come from [`derive_key`].
pub fn generate_random_key() -> DerivedKey {
    let key = ChaCha20Poly1305::generate_key(&mut OsRng);
    DerivedKey::from_bytes(key.into())
}
