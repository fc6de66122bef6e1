//! Identity provider interface.
//!
//! The sync layer needs exactly one signal from the account system: is
//! there an authenticated user, and what id keys their remote blob.
//! Login, tokens, and session refresh live entirely outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::RwLock;

/// Opaque identifier of the authenticated remote user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The currently authenticated user, or `None` when signed out.
    async fn current_user(&self) -> Option<UserId>;
}

/// Fixed identity for tests and single-account setups.
pub struct StaticIdentity {
    user: RwLock<Option<UserId>>,
}

impl StaticIdentity {
    pub fn signed_in(id: &str) -> Self {
        Self {
            user: RwLock::new(Some(UserId(id.to_string()))),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: RwLock::new(None),
        }
    }

    pub async fn set_user(&self, user: Option<UserId>) {
        *self.user.write().await = user;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Option<UserId> {
        self.user.read().await.clone()
    }
}
