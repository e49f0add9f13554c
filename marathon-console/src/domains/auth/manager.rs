use super::state_types::{AuthState, AuthToken, SessionStore};
use crate::infra::errors::{ConsoleError, ConsoleResult};
use crate::infra::services::auth::AuthService;

use marathon_core::console_prelude::AdminUser;
use std::sync::Arc;

/// Drives the session through login, restore and logout
#[derive(Debug, Clone)]
pub struct SessionManager {
    session: SessionStore,
    service: Arc<dyn AuthService>,
}

impl SessionManager {
    pub fn new(session: SessionStore, service: Arc<dyn AuthService>) -> Self {
        Self { session, service }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn current_user(&self) -> Option<AdminUser> {
        self.session.current_user()
    }

    /// Exchange credentials for a token, then load the account behind it
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> ConsoleResult<AdminUser> {
        log::info!("[Session] Logging in as {}", email);
        let token = self.service.login(email, password).await?;
        self.establish(token).await
    }

    /// Resume a session from a token obtained earlier
    pub async fn restore(&self, token: AuthToken) -> ConsoleResult<AdminUser> {
        log::debug!("[Session] Restoring session from existing token");
        self.establish(token).await
    }

    /// End the session. Observers are only notified if one was live.
    pub fn logout(&self) {
        if self.session.invalidate() {
            log::info!("[Session] Logged out");
        }
    }

    async fn establish(&self, token: AuthToken) -> ConsoleResult<AdminUser> {
        self.session.set(AuthState::Pending {
            token: token.clone(),
        });

        match self.service.current_user().await {
            Ok(user) => {
                log::info!("[Session] Authenticated as {}", user.email);
                self.session.set(AuthState::Authenticated {
                    user: user.clone(),
                    token,
                });
                Ok(user)
            }
            Err(ConsoleError::Unauthorized) => {
                if self.session.invalidate() {
                    log::warn!("[Session] Token rejected, logged out");
                }
                Err(ConsoleError::Unauthorized)
            }
            Err(err) => {
                // Token may still be fine; keep it pending so a retry works
                log::warn!("[Session] Could not load account: {}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::stubs::StubAuthService;

    fn manager(stub: &StubAuthService) -> SessionManager {
        SessionManager::new(SessionStore::new(), Arc::new(stub.clone()))
    }

    #[tokio::test]
    async fn login_authenticates_session() {
        let stub = StubAuthService::new();
        let manager = manager(&stub);

        let user = manager.login("admin@example.com", "secret").await.unwrap();

        assert_eq!(user, stub.user());
        assert!(manager.session().is_authenticated());
        assert_eq!(manager.current_user(), Some(stub.user()));
    }

    #[tokio::test]
    async fn bad_credentials_leave_session_empty() {
        let stub = StubAuthService::new();
        let manager = manager(&stub);

        assert!(manager.login("admin@example.com", "wrong").await.is_err());
        assert!(manager.session().token().is_none());
        assert_eq!(stub.me_calls(), 0);
    }

    #[tokio::test]
    async fn restore_with_revoked_token_logs_out() {
        let stub = StubAuthService::new();
        stub.revoke();
        let manager = manager(&stub);

        let err = manager.restore(stub.token()).await.unwrap_err();

        assert_eq!(err, ConsoleError::Unauthorized);
        assert!(matches!(
            manager.session().current(),
            AuthState::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn logout_after_rejection_does_not_notify_again() {
        let stub = StubAuthService::new();
        let manager = manager(&stub);
        manager.login("admin@example.com", "secret").await.unwrap();
        let mut observer = manager.session().subscribe();

        assert!(manager.session().invalidate());
        observer.changed().await.unwrap();
        manager.logout();

        assert!(!observer.has_changed().unwrap());
    }

    #[tokio::test]
    async fn logout_clears_user() {
        let stub = StubAuthService::new();
        let manager = manager(&stub);
        manager.login("admin@example.com", "secret").await.unwrap();

        manager.logout();
        assert!(manager.current_user().is_none());
    }
}
