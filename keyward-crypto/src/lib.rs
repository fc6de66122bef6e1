//! Key management core for Keyward.
//!
//! Provides the vault's cryptographic primitives:
//! - Argon2id key derivation from passwords, recovery phrases, and device secrets
//! - ChaCha20-Poly1305 authenticated encryption with optional associated data
//! - Factor-tagged key wrapping (envelope encryption of the vault key)
//! - Password verifier hashes with constant-time comparison
//! - Recovery phrase and password generation
//!
//! # Architecture
//!
//! A single random **vault key** protects everything the vault persists or
//! uploads. The vault key is never stored raw: it is wrapped (encrypted)
//! independently under a key derived from each enrolled authentication
//! factor. Unlocking with any one factor recovers the same vault key.
//!
//! This architecture allows:
//! - Resetting the password without touching the other factors or the data
//! - Adding and removing factors without re-encrypting anything
//! - Binding each wrap envelope to its factor so envelopes cannot be
//!   swapped between factors, even by someone who controls storage

mod cipher;
mod error;
mod key;
pub mod phrase;
mod verifier;
mod wrap;

pub use cipher::{
    open, open_from_string, open_with_aad, seal, seal_to_string, seal_with_aad, EncryptedData,
    NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, generate_random_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
pub use phrase::{
    generate_device_secret, generate_password, generate_recovery_phrase, RECOVERY_PHRASE_LEN,
};
pub use verifier::{check_verifier, make_verifier, Verifier};
pub use wrap::{unwrap_key, wrap_key, FactorTag, WrapEnvelope};
