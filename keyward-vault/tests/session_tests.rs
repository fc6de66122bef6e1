use keyward_crypto::{KdfParams, RECOVERY_PHRASE_LEN};
use keyward_storage::LocalStore;
use keyward_vault::{
    SessionManager, SessionStatus, StaticAuthenticator, VaultError, KEY_DERIVATION_SALT,
    KEY_WRAPPED_BY_PASSWORD, KEY_WRAPPED_BY_RECOVERY,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const PASSWORD: &str = "correct horse battery";

fn fresh_store() -> Arc<LocalStore> {
    Arc::new(LocalStore::open_in_memory().unwrap())
}

fn manager(store: Arc<LocalStore>) -> SessionManager {
    manager_with(store, StaticAuthenticator::approving())
}

fn manager_with(store: Arc<LocalStore>, auth: StaticAuthenticator) -> SessionManager {
    SessionManager::new(store, Arc::new(auth)).with_kdf_params(KdfParams::fast_insecure())
}

// ── Signup ───────────────────────────────────────────────────────

#[tokio::test]
async fn signup_unlocks_and_returns_recovery_phrase() {
    let mgr = manager(fresh_store());

    let phrase = mgr.signup(PASSWORD).await.unwrap();

    assert_eq!(phrase.len(), RECOVERY_PHRASE_LEN);
    assert!(phrase
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(mgr.status().await, SessionStatus::Unlocked);
    assert!(mgr.is_configured().unwrap());
}

#[tokio::test]
async fn signup_twice_fails() {
    let store = fresh_store();
    let mgr = manager(store.clone());
    mgr.signup(PASSWORD).await.unwrap();

    let second = manager(store);
    assert!(matches!(
        second.signup("another password").await,
        Err(VaultError::AlreadyConfigured)
    ));
}

#[tokio::test]
async fn short_password_is_rejected() {
    let mgr = manager(fresh_store());

    assert!(matches!(
        mgr.signup("short").await,
        Err(VaultError::PasswordTooShort)
    ));
    assert!(!mgr.is_configured().unwrap());
}

// ── Password login ───────────────────────────────────────────────

#[tokio::test]
async fn login_roundtrip() {
    let mgr = manager(fresh_store());
    mgr.signup(PASSWORD).await.unwrap();
    mgr.logout().await;
    assert_eq!(mgr.status().await, SessionStatus::Locked);

    mgr.login(PASSWORD).await.unwrap();

    assert_eq!(mgr.status().await, SessionStatus::Unlocked);
    assert!(mgr.vault_key_snapshot().await.is_some());
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let mgr = manager(fresh_store());
    mgr.signup(PASSWORD).await.unwrap();
    mgr.logout().await;

    assert!(matches!(
        mgr.login("not the password").await,
        Err(VaultError::WrongPassword)
    ));
    assert_eq!(mgr.status().await, SessionStatus::Locked);
}

#[tokio::test]
async fn login_before_signup_fails() {
    let mgr = manager(fresh_store());

    assert!(matches!(
        mgr.login(PASSWORD).await,
        Err(VaultError::NotConfigured)
    ));
}

#[tokio::test]
async fn damaged_registry_reports_corrupted() {
    let store = fresh_store();
    let mgr = manager(store.clone());
    mgr.signup(PASSWORD).await.unwrap();
    mgr.logout().await;

    // Simulate a partially wiped settings table.
    store.delete_setting(KEY_DERIVATION_SALT).unwrap();

    assert!(matches!(
        mgr.login(PASSWORD).await,
        Err(VaultError::Corrupted(_))
    ));
}

// ── Recovery ─────────────────────────────────────────────────────

#[tokio::test]
async fn recovery_flow_resets_password() {
    let mgr = manager(fresh_store());
    let phrase = mgr.signup(PASSWORD).await.unwrap();
    mgr.logout().await;

    mgr.recover(&phrase).await.unwrap();
    assert_eq!(mgr.status().await, SessionStatus::RecoveryPending);
    // The recovered key stays sealed until the reset completes.
    assert!(mgr.vault_key_snapshot().await.is_none());

    mgr.reset_password("brand new password").await.unwrap();
    assert_eq!(mgr.status().await, SessionStatus::Unlocked);

    // Old password is gone, the new one works.
    mgr.logout().await;
    assert!(matches!(
        mgr.login(PASSWORD).await,
        Err(VaultError::WrongPassword)
    ));
    mgr.login("brand new password").await.unwrap();
}

#[tokio::test]
async fn recovery_phrase_survives_password_reset() {
    let mgr = manager(fresh_store());
    let phrase = mgr.signup(PASSWORD).await.unwrap();
    mgr.logout().await;

    mgr.recover(&phrase).await.unwrap();
    mgr.reset_password("brand new password").await.unwrap();
    mgr.logout().await;

    // The same phrase still opens recovery after the reset.
    mgr.recover(&phrase).await.unwrap();
    assert_eq!(mgr.status().await, SessionStatus::RecoveryPending);
}

#[tokio::test]
async fn wrong_phrase_is_rejected() {
    let mgr = manager(fresh_store());
    mgr.signup(PASSWORD).await.unwrap();
    mgr.logout().await;

    let bogus = "A".repeat(RECOVERY_PHRASE_LEN);
    assert!(matches!(
        mgr.recover(&bogus).await,
        Err(VaultError::InvalidRecoveryPhrase)
    ));
    assert_eq!(mgr.status().await, SessionStatus::Locked);
}

#[tokio::test]
async fn recover_before_signup_fails() {
    let mgr = manager(fresh_store());

    assert!(matches!(
        mgr.recover("WHATEVER").await,
        Err(VaultError::RecoveryNotConfigured)
    ));
}

#[tokio::test]
async fn reset_without_pending_recovery_fails() {
    let mgr = manager(fresh_store());
    mgr.signup(PASSWORD).await.unwrap();

    // Unlocked is not RecoveryPending.
    assert!(matches!(
        mgr.reset_password("brand new password").await,
        Err(VaultError::SessionExpired)
    ));

    mgr.logout().await;
    assert!(matches!(
        mgr.reset_password("brand new password").await,
        Err(VaultError::SessionExpired)
    ));
}

#[tokio::test]
async fn phrase_input_is_normalized() {
    let mgr = manager(fresh_store());
    let phrase = mgr.signup(PASSWORD).await.unwrap();
    mgr.logout().await;

    // Lowercased and padded, the way a phrase typed from paper arrives.
    let sloppy = format!("  {}  \n", phrase.to_lowercase());
    mgr.recover(&sloppy).await.unwrap();
    assert_eq!(mgr.status().await, SessionStatus::RecoveryPending);
}

// ── Biometry ─────────────────────────────────────────────────────

#[tokio::test]
async fn biometric_enrollment_and_login() {
    let store = fresh_store();
    let mgr = manager(store.clone());
    mgr.signup(PASSWORD).await.unwrap();

    assert!(!mgr.has_biometry_enrolled().unwrap());
    mgr.enable_biometry().await.unwrap();
    assert!(mgr.has_biometry_enrolled().unwrap());

    // A fresh manager over the same store unlocks via the prompt alone.
    let second = manager(store);
    second.login_with_biometry().await.unwrap();
    assert_eq!(second.status().await, SessionStatus::Unlocked);
}

#[tokio::test]
async fn biometric_login_requires_enrollment() {
    let mgr = manager(fresh_store());
    mgr.signup(PASSWORD).await.unwrap();
    mgr.logout().await;

    assert!(matches!(
        mgr.login_with_biometry().await,
        Err(VaultError::BiometryNotEnrolled)
    ));
}

#[tokio::test]
async fn denied_prompt_keeps_vault_locked() {
    let store = fresh_store();
    let mgr = manager(store.clone());
    mgr.signup(PASSWORD).await.unwrap();
    mgr.enable_biometry().await.unwrap();

    let denying = manager_with(store, StaticAuthenticator::denying());
    assert!(matches!(
        denying.login_with_biometry().await,
        Err(VaultError::BiometryDenied)
    ));
    assert_eq!(denying.status().await, SessionStatus::Locked);
}

#[tokio::test]
async fn denied_enrollment_leaves_no_record() {
    let mgr = manager_with(fresh_store(), StaticAuthenticator::denying());
    mgr.signup(PASSWORD).await.unwrap();

    assert!(matches!(
        mgr.enable_biometry().await,
        Err(VaultError::BiometryDenied)
    ));
    assert!(!mgr.has_biometry_enrolled().unwrap());
}

#[tokio::test]
async fn unavailable_hardware_blocks_enrollment() {
    let mgr = manager_with(fresh_store(), StaticAuthenticator::unavailable());
    mgr.signup(PASSWORD).await.unwrap();

    assert!(!mgr.biometry_available().await);
    assert!(matches!(
        mgr.enable_biometry().await,
        Err(VaultError::BiometryUnavailable)
    ));
}

#[tokio::test]
async fn enrollment_requires_unlocked_session() {
    let mgr = manager(fresh_store());
    mgr.signup(PASSWORD).await.unwrap();
    mgr.logout().await;

    assert!(matches!(
        mgr.enable_biometry().await,
        Err(VaultError::Locked)
    ));
}

#[tokio::test]
async fn enrolling_biometry_leaves_other_envelopes_untouched() {
    let store = fresh_store();
    let mgr = manager(store.clone());
    mgr.signup(PASSWORD).await.unwrap();

    let password_envelope = store.get_setting(KEY_WRAPPED_BY_PASSWORD).unwrap();
    let recovery_envelope = store.get_setting(KEY_WRAPPED_BY_RECOVERY).unwrap();

    mgr.enable_biometry().await.unwrap();

    assert_eq!(
        store.get_setting(KEY_WRAPPED_BY_PASSWORD).unwrap(),
        password_envelope
    );
    assert_eq!(
        store.get_setting(KEY_WRAPPED_BY_RECOVERY).unwrap(),
        recovery_envelope
    );
}

#[tokio::test]
async fn password_reset_preserves_biometric_login() {
    let mgr = manager(fresh_store());
    let phrase = mgr.signup(PASSWORD).await.unwrap();
    mgr.enable_biometry().await.unwrap();
    mgr.logout().await;

    mgr.recover(&phrase).await.unwrap();
    mgr.reset_password("brand new password").await.unwrap();
    mgr.logout().await;

    // The biometric envelope still wraps the same vault key.
    mgr.login_with_biometry().await.unwrap();
    assert_eq!(mgr.status().await, SessionStatus::Unlocked);
}

// ── Session lifecycle ────────────────────────────────────────────

#[tokio::test]
async fn logout_is_idempotent() {
    let mgr = manager(fresh_store());
    mgr.signup(PASSWORD).await.unwrap();

    mgr.logout().await;
    mgr.logout().await;

    assert_eq!(mgr.status().await, SessionStatus::Locked);
    assert!(mgr.vault_key_snapshot().await.is_none());
}

#[tokio::test]
async fn second_manager_shares_the_registry() {
    let store = fresh_store();
    manager(store.clone()).signup(PASSWORD).await.unwrap();

    let second = manager(store);
    assert!(second.is_configured().unwrap());
    assert_eq!(second.status().await, SessionStatus::Locked);
    second.login(PASSWORD).await.unwrap();
}

#[tokio::test]
async fn every_factor_recovers_the_same_vault_key() {
    let mgr = manager(fresh_store());
    let phrase = mgr.signup(PASSWORD).await.unwrap();
    mgr.enable_biometry().await.unwrap();
    let from_signup = mgr.vault_key_snapshot().await.unwrap();

    mgr.logout().await;
    mgr.login(PASSWORD).await.unwrap();
    let from_password = mgr.vault_key_snapshot().await.unwrap();

    mgr.logout().await;
    mgr.login_with_biometry().await.unwrap();
    let from_biometry = mgr.vault_key_snapshot().await.unwrap();

    mgr.logout().await;
    mgr.recover(&phrase).await.unwrap();
    mgr.reset_password("brand new password").await.unwrap();
    let from_reset = mgr.vault_key_snapshot().await.unwrap();

    assert_eq!(from_signup.as_bytes(), from_password.as_bytes());
    assert_eq!(from_signup.as_bytes(), from_biometry.as_bytes());
    assert_eq!(from_signup.as_bytes(), from_reset.as_bytes());
}
