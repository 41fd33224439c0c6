//! # rj-auth-simple
//!
//! Session-based implementation of `AuthProvider`.
//! A device holds at most one signed-in user; local profiles map to stable ids.

use async_trait::async_trait;
use rj_core::models::UserId;
use rj_core::traits::AuthProvider;
use rj_core::StoreError;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Namespace for profile-derived user ids.
const PROFILE_NAMESPACE: Uuid = Uuid::from_u128(0x6a0f_3c2e_51b4_4d7a_9e18_2b7c_04d9_aa31);

#[derive(Default)]
pub struct SessionAuthProvider {
    session: RwLock<Option<UserId>>,
}

impl SessionAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            session: RwLock::new(Some(user_id)),
        }
    }

    /// Signs in the stable user id of a named local profile.
    pub fn for_profile(name: &str) -> Self {
        Self::signed_in(profile_user_id(name))
    }

    pub async fn sign_in(&self, user_id: UserId) {
        *self.session.write().await = Some(user_id);
        info!(%user_id, "signed in");
    }

    pub async fn sign_out(&self) {
        if self.session.write().await.take().is_some() {
            info!("signed out");
        }
    }
}

/// Same name, same id, on every run.
pub fn profile_user_id(name: &str) -> UserId {
    Uuid::new_v5(&PROFILE_NAMESPACE, name.trim().to_lowercase().as_bytes())
}

#[async_trait]
impl AuthProvider for SessionAuthProvider {
    async fn current_user_id(&self) -> Result<UserId, StoreError> {
        (*self.session.read().await).ok_or(StoreError::Unauthenticated)
    }
}
