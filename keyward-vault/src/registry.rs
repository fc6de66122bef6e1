//! Factor registry: persisted key-wrap material in the settings table.
//!
//! Every unlock factor leaves the same footprint: a salt, and the vault key
//! wrapped under a key derived from that factor's secret. The password
//! factor additionally stores a verifier hash (with its own salt) so a bad
//! password is rejected before any unwrap is attempted. All values are
//! stored as JSON strings under fixed keys, written transactionally so a
//! factor is never half-registered.

use crate::error::{VaultError, VaultResult};
use crate::CredentialHandle;
use keyward_crypto::{Salt, Verifier, WrapEnvelope};
use keyward_storage::LocalStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

// ── Settings keys ────────────────────────────────────────────────

pub const KEY_VERIFIER: &str = "verifier";
pub const KEY_DERIVATION_SALT: &str = "derivationSalt";
pub const KEY_VERIFIER_SALT: &str = "verifierSalt";
pub const KEY_WRAPPED_BY_PASSWORD: &str = "wrappedByPassword";
pub const KEY_RECOVERY_SALT: &str = "recoverySalt";
pub const KEY_WRAPPED_BY_RECOVERY: &str = "wrappedByRecovery";
pub const KEY_BIOMETRY_SALT: &str = "biometrySalt";
pub const KEY_WRAPPED_BY_BIOMETRY: &str = "wrappedByBiometry";
pub const KEY_BIOMETRY_SECRET: &str = "biometrySecret";
pub const KEY_BIOMETRY_CREDENTIAL: &str = "biometryCredential";

/// Settings keys that must never leave the device.
///
/// The biometric device secret works like a hardware-bound token; shipping
/// it in a backup would let any device that restores the backup unlock the
/// vault without the biometric prompt.
pub const LOCAL_ONLY_KEYS: &[&str] = &[KEY_BIOMETRY_SECRET];

// ── Per-factor records ───────────────────────────────────────────

/// Everything the password factor persists.
pub struct PasswordRecord {
    pub verifier: Verifier,
    pub derivation_salt: Salt,
    pub verifier_salt: Salt,
    pub envelope: WrapEnvelope,
}

/// Everything the recovery factor persists.
pub struct RecoveryRecord {
    pub salt: Salt,
    pub envelope: WrapEnvelope,
}

/// Everything the biometric factor persists.
pub struct BiometryRecord {
    pub secret: String,
    pub salt: Salt,
    pub envelope: WrapEnvelope,
    pub credential: CredentialHandle,
}

// ── Registry ─────────────────────────────────────────────────────

/// Reads and writes factor records in the settings table.
#[derive(Clone)]
pub struct FactorRegistry {
    store: Arc<LocalStore>,
}

impl FactorRegistry {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    /// Whether signup has ever completed (the verifier exists).
    pub fn is_configured(&self) -> VaultResult<bool> {
        Ok(self.store.get_setting(KEY_VERIFIER)?.is_some())
    }

    /// Whether a biometric factor is enrolled.
    pub fn has_biometry_enrolled(&self) -> VaultResult<bool> {
        Ok(self.store.get_setting(KEY_WRAPPED_BY_BIOMETRY)?.is_some())
    }

    /// Loads the password record.
    ///
    /// A missing verifier means signup never ran (`NotConfigured`); any
    /// other missing or undecodable key means the registry was damaged
    /// after signup (`Corrupted`).
    pub fn load_password_record(&self) -> VaultResult<PasswordRecord> {
        let verifier = self
            .get_json::<Verifier>(KEY_VERIFIER)?
            .ok_or(VaultError::NotConfigured)?;

        Ok(PasswordRecord {
            verifier,
            derivation_salt: self.require_json(KEY_DERIVATION_SALT)?,
            verifier_salt: self.require_json(KEY_VERIFIER_SALT)?,
            envelope: self.require_json(KEY_WRAPPED_BY_PASSWORD)?,
        })
    }

    /// Loads the recovery record, or `RecoveryNotConfigured` if absent.
    pub fn load_recovery_record(&self) -> VaultResult<RecoveryRecord> {
        let salt = self
            .get_json::<Salt>(KEY_RECOVERY_SALT)?
            .ok_or(VaultError::RecoveryNotConfigured)?;

        Ok(RecoveryRecord {
            salt,
            envelope: self.require_json(KEY_WRAPPED_BY_RECOVERY)?,
        })
    }

    /// Loads the biometric record, or `BiometryNotEnrolled` if absent.
    pub fn load_biometry_record(&self) -> VaultResult<BiometryRecord> {
        let envelope = self
            .get_json::<WrapEnvelope>(KEY_WRAPPED_BY_BIOMETRY)?
            .ok_or(VaultError::BiometryNotEnrolled)?;

        Ok(BiometryRecord {
            secret: self.require_json(KEY_BIOMETRY_SECRET)?,
            salt: self.require_json(KEY_BIOMETRY_SALT)?,
            envelope,
            credential: self.require_json(KEY_BIOMETRY_CREDENTIAL)?,
        })
    }

    /// Persists both signup factors (password + recovery) in one transaction.
    pub fn store_signup(
        &self,
        password: &PasswordRecord,
        recovery: &RecoveryRecord,
    ) -> VaultResult<()> {
        self.store.put_settings(&[
            (KEY_VERIFIER, encode(&password.verifier)?),
            (KEY_DERIVATION_SALT, encode(&password.derivation_salt)?),
            (KEY_VERIFIER_SALT, encode(&password.verifier_salt)?),
            (KEY_WRAPPED_BY_PASSWORD, encode(&password.envelope)?),
            (KEY_RECOVERY_SALT, encode(&recovery.salt)?),
            (KEY_WRAPPED_BY_RECOVERY, encode(&recovery.envelope)?),
        ])?;
        Ok(())
    }

    /// Replaces the password record (after a recovery reset). The recovery
    /// and biometric factors are untouched.
    pub fn replace_password_record(&self, password: &PasswordRecord) -> VaultResult<()> {
        self.store.put_settings(&[
            (KEY_VERIFIER, encode(&password.verifier)?),
            (KEY_DERIVATION_SALT, encode(&password.derivation_salt)?),
            (KEY_VERIFIER_SALT, encode(&password.verifier_salt)?),
            (KEY_WRAPPED_BY_PASSWORD, encode(&password.envelope)?),
        ])?;
        Ok(())
    }

    /// Persists the biometric factor in one transaction.
    pub fn store_biometry_record(&self, biometry: &BiometryRecord) -> VaultResult<()> {
        self.store.put_settings(&[
            (KEY_BIOMETRY_SECRET, encode(&biometry.secret)?),
            (KEY_BIOMETRY_SALT, encode(&biometry.salt)?),
            (KEY_WRAPPED_BY_BIOMETRY, encode(&biometry.envelope)?),
            (KEY_BIOMETRY_CREDENTIAL, encode(&biometry.credential)?),
        ])?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &'static str) -> VaultResult<Option<T>> {
        match self.store.get_setting(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .map_err(|e| VaultError::Corrupted(format!("{key}: {e}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn require_json<T: DeserializeOwned>(&self, key: &'static str) -> VaultResult<T> {
        self.get_json(key)?
            .ok_or_else(|| VaultError::Corrupted(format!("{key} is missing")))
    }
}

fn encode<T: Serialize>(value: &T) -> VaultResult<String> {
    serde_json::to_string(value).map_err(|e| VaultError::Serialization(e.to_string()))
}
