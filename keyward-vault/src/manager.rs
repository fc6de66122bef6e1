//! Session state machine over the factor registry.
//!
//! One `SessionManager` guards one vault. Every factor operation funnels
//! through a single async mutex over the session state, so concurrent
//! unlock attempts and resets serialize instead of interleaving.

use crate::authenticator::PlatformAuthenticator;
use crate::error::{VaultError, VaultResult};
use crate::registry::{BiometryRecord, FactorRegistry, PasswordRecord, RecoveryRecord};
use keyward_crypto::{
    check_verifier, derive_key, generate_device_secret, generate_random_key,
    generate_recovery_phrase, make_verifier, unwrap_key, wrap_key, DerivedKey, FactorTag,
    KdfParams, Salt,
};
use keyward_storage::LocalStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Minimum accepted password length for signup and reset.
pub const MIN_PASSWORD_LEN: usize = 8;

// ============================================================================
// Session state
// ============================================================================

/// Where the session currently holds key material. Dropping a state that
/// carries a key zeroizes it.
enum SessionState {
    Locked,
    Unlocked { vault_key: DerivedKey },
    RecoveryPending { vault_key: DerivedKey },
}

/// Externally visible session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Locked,
    Unlocked,
    RecoveryPending,
}

// ============================================================================
// SessionManager
// ============================================================================

/// Drives one vault through its session lifecycle.
///
/// The vault key itself is random; each factor only wraps it. Unlocking
/// with any factor therefore yields the same key, and replacing a factor
/// never requires re-encrypting vault data.
pub struct SessionManager {
    registry: FactorRegistry,
    authenticator: Arc<dyn PlatformAuthenticator>,
    kdf: KdfParams,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(store: Arc<LocalStore>, authenticator: Arc<dyn PlatformAuthenticator>) -> Self {
        Self {
            registry: FactorRegistry::new(store),
            authenticator,
            kdf: KdfParams::default(),
            state: Mutex::new(SessionState::Locked),
        }
    }

    /// Overrides the key derivation cost (tests use a fast profile).
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// First-time setup. Registers the password and recovery factors and
    /// unlocks the session.
    ///
    /// 1. Generates a random vault key.
    /// 2. Wraps it under a key derived from the password, and stores a
    ///    verifier hash (with its own salt) for fast password rejection.
    /// 3. Generates a recovery phrase and wraps the vault key under a key
    ///    derived from it as well.
    /// 4. Persists both factors in one transaction and unlocks.
    ///
    /// Returns the recovery phrase. It is never stored anywhere; this is
    /// the caller's only chance to show it to the user.
    pub async fn signup(&self, password: &str) -> VaultResult<String> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(VaultError::PasswordTooShort);
        }

        let mut state = self.state.lock().await;
        if self.registry.is_configured()? {
            return Err(VaultError::AlreadyConfigured);
        }

        let vault_key = generate_random_key();

        // Password factor
        let derivation_salt = Salt::random();
        let verifier_salt = Salt::random();
        let password_key = derive_key(password, &derivation_salt, &self.kdf)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;
        let password_record = PasswordRecord {
            verifier: make_verifier(password, &verifier_salt, &self.kdf)
                .map_err(|e| VaultError::Crypto(e.to_string()))?,
            derivation_salt,
            verifier_salt,
            envelope: wrap_key(&vault_key, &password_key, FactorTag::Password)
                .map_err(|e| VaultError::Crypto(e.to_string()))?,
        };

        // Recovery factor
        let phrase = generate_recovery_phrase();
        let recovery_salt = Salt::random();
        let recovery_key = derive_key(&phrase, &recovery_salt, &self.kdf)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;
        let recovery_record = RecoveryRecord {
            salt: recovery_salt,
            envelope: wrap_key(&vault_key, &recovery_key, FactorTag::Recovery)
                .map_err(|e| VaultError::Crypto(e.to_string()))?,
        };

        self.registry
            .store_signup(&password_record, &recovery_record)?;
        *state = SessionState::Unlocked { vault_key };
        info!("vault configured, session unlocked");

        Ok(phrase)
    }

    /// Unlocks with the master password.
    ///
    /// The verifier check runs before any unwrap is attempted, so a wrong
    /// password is reported as `WrongPassword` rather than a bare
    /// decryption failure.
    pub async fn login(&self, password: &str) -> VaultResult<()> {
        let mut state = self.state.lock().await;
        let record = self.registry.load_password_record()?;

        let ok = check_verifier(password, &record.verifier_salt, &self.kdf, &record.verifier)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;
        if !ok {
            return Err(VaultError::WrongPassword);
        }

        let password_key = derive_key(password, &record.derivation_salt, &self.kdf)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;
        let vault_key = unwrap_key(&record.envelope, &password_key, FactorTag::Password)
            .map_err(|e| VaultError::Decryption(e.to_string()))?;

        *state = SessionState::Unlocked { vault_key };
        info!("session unlocked with password");
        Ok(())
    }

    /// Verifies a recovery phrase and parks the session in
    /// `RecoveryPending`, from which only [`reset_password`](Self::reset_password)
    /// can proceed.
    ///
    /// Input is normalized (trimmed, uppercased) so a phrase typed back
    /// from paper survives stray whitespace and case differences.
    pub async fn recover(&self, phrase: &str) -> VaultResult<()> {
        let mut state = self.state.lock().await;
        let record = self.registry.load_recovery_record()?;

        let normalized = phrase.trim().to_uppercase();
        let recovery_key = derive_key(&normalized, &record.salt, &self.kdf)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;
        let vault_key = unwrap_key(&record.envelope, &recovery_key, FactorTag::Recovery)
            .map_err(|_| VaultError::InvalidRecoveryPhrase)?;

        *state = SessionState::RecoveryPending { vault_key };
        info!("recovery phrase accepted, awaiting password reset");
        Ok(())
    }

    /// Sets a new password after a successful [`recover`](Self::recover).
    ///
    /// 1. Requires a pending recovery session; fails with `SessionExpired`
    ///    otherwise.
    /// 2. Derives a new wrapping key and verifier from `new_password`
    ///    with fresh salts.
    /// 3. Replaces the password record in one transaction. The recovery
    ///    and biometric envelopes still wrap the same vault key, so both
    ///    keep working unchanged.
    /// 4. Unlocks the session.
    pub async fn reset_password(&self, new_password: &str) -> VaultResult<()> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(VaultError::PasswordTooShort);
        }

        let mut state = self.state.lock().await;
        let vault_key = match &*state {
            SessionState::RecoveryPending { vault_key } => vault_key.clone(),
            _ => return Err(VaultError::SessionExpired),
        };

        let derivation_salt = Salt::random();
        let verifier_salt = Salt::random();
        let password_key = derive_key(new_password, &derivation_salt, &self.kdf)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;
        let record = PasswordRecord {
            verifier: make_verifier(new_password, &verifier_salt, &self.kdf)
                .map_err(|e| VaultError::Crypto(e.to_string()))?,
            derivation_salt,
            verifier_salt,
            envelope: wrap_key(&vault_key, &password_key, FactorTag::Password)
                .map_err(|e| VaultError::Crypto(e.to_string()))?,
        };

        self.registry.replace_password_record(&record)?;
        *state = SessionState::Unlocked { vault_key };
        info!("password reset complete, session unlocked");
        Ok(())
    }

    /// Enrolls the biometric factor. The session must be unlocked.
    ///
    /// The platform consent prompt runs before anything is generated or
    /// persisted; a denied prompt leaves no trace in the registry.
    pub async fn enable_biometry(&self) -> VaultResult<()> {
        let state = self.state.lock().await;
        let vault_key = match &*state {
            SessionState::Unlocked { vault_key } => vault_key.clone(),
            _ => return Err(VaultError::Locked),
        };

        if !self.authenticator.is_available().await {
            return Err(VaultError::BiometryUnavailable);
        }
        let credential = self.authenticator.enroll().await?;

        let secret = generate_device_secret();
        let salt = Salt::random();
        let biometry_key = derive_key(&secret, &salt, &self.kdf)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;
        let record = BiometryRecord {
            envelope: wrap_key(&vault_key, &biometry_key, FactorTag::Biometry)
                .map_err(|e| VaultError::Crypto(e.to_string()))?,
            secret,
            salt,
            credential,
        };

        self.registry.store_biometry_record(&record)?;
        info!("biometric factor enrolled");
        Ok(())
    }

    /// Unlocks via the platform biometric prompt.
    pub async fn login_with_biometry(&self) -> VaultResult<()> {
        let mut state = self.state.lock().await;
        let record = self.registry.load_biometry_record()?;

        if !self.authenticator.is_available().await {
            return Err(VaultError::BiometryUnavailable);
        }
        self.authenticator
            .assert_presence(&record.credential)
            .await?;

        let biometry_key = derive_key(&record.secret, &record.salt, &self.kdf)
            .map_err(|e| VaultError::Crypto(e.to_string()))?;
        let vault_key = unwrap_key(&record.envelope, &biometry_key, FactorTag::Biometry)
            .map_err(|e| VaultError::Decryption(e.to_string()))?;

        *state = SessionState::Unlocked { vault_key };
        info!("session unlocked with biometrics");
        Ok(())
    }

    /// Locks the session and drops key material. Idempotent.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::Locked;
        info!("session locked");
    }

    /// Current lifecycle position.
    pub async fn status(&self) -> SessionStatus {
        match &*self.state.lock().await {
            SessionState::Locked => SessionStatus::Locked,
            SessionState::Unlocked { .. } => SessionStatus::Unlocked,
            SessionState::RecoveryPending { .. } => SessionStatus::RecoveryPending,
        }
    }

    pub async fn is_unlocked(&self) -> bool {
        matches!(self.status().await, SessionStatus::Unlocked)
    }

    /// Whether signup has ever completed.
    pub fn is_configured(&self) -> VaultResult<bool> {
        self.registry.is_configured()
    }

    /// Whether a biometric factor is enrolled in this vault.
    pub fn has_biometry_enrolled(&self) -> VaultResult<bool> {
        self.registry.has_biometry_enrolled()
    }

    /// Whether biometric hardware is usable on this device.
    pub async fn biometry_available(&self) -> bool {
        self.authenticator.is_available().await
    }

    /// Clones the vault key if the session is unlocked.
    ///
    /// `RecoveryPending` deliberately returns `None`: a key recovered from
    /// the phrase may only be used to finish the reset, not to read data.
    pub async fn vault_key_snapshot(&self) -> Option<DerivedKey> {
        match &*self.state.lock().await {
            SessionState::Unlocked { vault_key } => Some(vault_key.clone()),
            _ => None,
        }
    }
}
