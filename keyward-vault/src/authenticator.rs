//! Platform biometric authenticator abstraction.
//!
//! The session manager never talks to biometric hardware directly; it goes
//! through [`PlatformAuthenticator`] so desktop builds can plug in the OS
//! keychain prompt while headless builds and tests use
//! [`StaticAuthenticator`].

use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle to a platform-registered biometric credential.
///
/// The platform decides what goes inside (a keychain item name, a Windows
/// Hello key id). The vault only stores and echoes it back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialHandle(pub String);

#[async_trait]
pub trait PlatformAuthenticator: Send + Sync {
    /// Whether biometric hardware is present and usable right now.
    async fn is_available(&self) -> bool;

    /// Registers a new credential. Must prompt the user for consent and
    /// fail if consent is not given.
    async fn enroll(&self) -> VaultResult<CredentialHandle>;

    /// Prompts for user presence against a previously enrolled credential.
    async fn assert_presence(&self, credential: &CredentialHandle) -> VaultResult<()>;
}

/// Fixed-outcome authenticator for tests and platforms without biometric
/// hardware.
pub struct StaticAuthenticator {
    available: bool,
    approve: bool,
}

impl StaticAuthenticator {
    /// Hardware present, every prompt approved.
    pub fn approving() -> Self {
        Self {
            available: true,
            approve: true,
        }
    }

    /// Hardware present, every prompt denied.
    pub fn denying() -> Self {
        Self {
            available: true,
            approve: false,
        }
    }

    /// No biometric hardware at all.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            approve: false,
        }
    }

    fn check(&self) -> VaultResult<()> {
        if !self.available {
            return Err(VaultError::BiometryUnavailable);
        }
        if !self.approve {
            return Err(VaultError::BiometryDenied);
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformAuthenticator for StaticAuthenticator {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn enroll(&self) -> VaultResult<CredentialHandle> {
        self.check()?;
        Ok(CredentialHandle(format!("static-{}", Uuid::new_v4())))
    }

    async fn assert_presence(&self, _credential: &CredentialHandle) -> VaultResult<()> {
        self.check()
    }
}
