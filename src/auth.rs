//! Remote session state.
//!
//! The sync bridge only needs to know whether someone is signed in and who.
//! How a provider grants the token (OAuth popup, password, ...) stays behind
//! [`LoginProvider`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::remote::RemoteError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token plus the user it belongs to.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub token: String,
    pub user: UserIdentity,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthGrant {
    fn is_valid(&self) -> bool {
        !self.token.trim().is_empty() && self.expires_at.map_or(true, |exp| exp > Utc::now())
    }
}

#[async_trait]
pub trait LoginProvider: Send + Sync {
    async fn authenticate(&self, provider: &str) -> Result<AuthGrant, RemoteError>;
}

#[async_trait]
pub trait AuthSession: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn current_user(&self) -> Option<UserIdentity>;
    async fn login(&self, provider: &str) -> Result<UserIdentity, RemoteError>;
    fn logout(&self);
}

/// In-memory token store. Auth changes are published on a watch channel.
pub struct TokenSession {
    grant: RwLock<Option<AuthGrant>>,
    provider: Option<Arc<dyn LoginProvider>>,
    auth_tx: watch::Sender<bool>,
}

impl TokenSession {
    pub fn new(provider: Option<Arc<dyn LoginProvider>>) -> Self {
        let (auth_tx, _) = watch::channel(false);
        Self {
            grant: RwLock::new(None),
            provider,
            auth_tx,
        }
    }

    /// Install a grant obtained elsewhere (e.g. restored from a previous run).
    pub fn set_grant(&self, grant: AuthGrant) {
        match self.grant.write() {
            Ok(mut guard) => *guard = Some(grant),
            Err(e) => {
                warn!("auth grant lock poisoned: {e}");
                return;
            }
        }
        self.publish();
    }

    fn valid_grant(&self) -> Option<AuthGrant> {
        self.grant
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .filter(AuthGrant::is_valid)
    }

    pub fn token(&self) -> Option<String> {
        self.valid_grant().map(|g| g.token)
    }

    /// Fires with the new authenticated flag on every login/logout.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.auth_tx.subscribe()
    }

    fn publish(&self) {
        let authed = self.is_authenticated();
        self.auth_tx.send_replace(authed);
    }
}

#[async_trait]
impl AuthSession for TokenSession {
    fn is_authenticated(&self) -> bool {
        self.valid_grant().is_some()
    }

    fn current_user(&self) -> Option<UserIdentity> {
        self.valid_grant().map(|g| g.user)
    }

    async fn login(&self, provider: &str) -> Result<UserIdentity, RemoteError> {
        let login_provider = self.provider.as_ref().ok_or(RemoteError::Unauthenticated)?;
        let grant = login_provider.authenticate(provider).await?;
        let user = grant.user.clone();
        info!(user_id = %user.id, provider, "signed in");
        self.set_grant(grant);
        Ok(user)
    }

    fn logout(&self) {
        if let Ok(mut guard) = self.grant.write() {
            if let Some(grant) = guard.take() {
                info!(user_id = %grant.user.id, "signed out");
            }
        }
        self.publish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider;

    #[async_trait]
    impl LoginProvider for StaticProvider {
        async fn authenticate(&self, provider: &str) -> Result<AuthGrant, RemoteError> {
            if provider != "google" {
                return Err(RemoteError::Unauthenticated);
            }
            Ok(AuthGrant {
                token: "tok".into(),
                user: UserIdentity {
                    id: "u1".into(),
                    email: Some("chef@example.com".into()),
                },
                expires_at: None,
            })
        }
    }

    #[tokio::test]
    async fn test_login_and_logout_publish_changes() {
        let session = TokenSession::new(Some(Arc::new(StaticProvider)));
        let mut rx = session.subscribe();
        assert!(!session.is_authenticated());

        let user = session.login("google").await.unwrap();
        assert_eq!(user.id, "u1");
        assert!(session.is_authenticated());
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
        assert!(!*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn test_login_without_provider_fails() {
        let session = TokenSession::new(None);
        assert!(matches!(
            session.login("google").await,
            Err(RemoteError::Unauthenticated)
        ));
    }

    #[test]
    fn test_expired_grant_is_not_authenticated() {
        let session = TokenSession::new(None);
        session.set_grant(AuthGrant {
            token: "tok".into(),
            user: UserIdentity {
                id: "u1".into(),
                email: None,
            },
            expires_at: Some(Utc::now() - chrono::Duration::minutes(1)),
        });
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }
}
