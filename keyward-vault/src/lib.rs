//! Session and key lifecycle for the Keyward vault.
//!
//! The vault key is random and never derived from a user secret directly.
//! Each unlock factor (password, recovery phrase, biometric device secret)
//! independently wraps that one key, so factors can be replaced without
//! touching vault data. [`SessionManager`] owns the state machine;
//! [`FactorRegistry`] owns what gets persisted.
//!
//! Unlock paths:
//! - `signup` / `login` with the master password
//! - `recover` + `reset_password` with the recovery phrase
//! - `login_with_biometry` through a [`PlatformAuthenticator`]
//!
//! All of them end in the same place: an unlocked session holding the
//! vault key, available to callers via `vault_key_snapshot`.

mod authenticator;
mod error;
mod manager;
mod registry;

pub use authenticator::{CredentialHandle, PlatformAuthenticator, StaticAuthenticator};
pub use error::{VaultError, VaultResult};
pub use manager::{SessionManager, SessionStatus, MIN_PASSWORD_LEN};
pub use registry::{
    BiometryRecord, FactorRegistry, PasswordRecord, RecoveryRecord, KEY_BIOMETRY_CREDENTIAL,
    KEY_BIOMETRY_SALT, KEY_BIOMETRY_SECRET, KEY_DERIVATION_SALT, KEY_RECOVERY_SALT, KEY_VERIFIER,
    KEY_VERIFIER_SALT, KEY_WRAPPED_BY_BIOMETRY, KEY_WRAPPED_BY_PASSWORD, KEY_WRAPPED_BY_RECOVERY,
    LOCAL_ONLY_KEYS,
};
