use crate::domains::auth::state_types::AuthToken;
use crate::infra::errors::{ConsoleError, ConsoleResult};
use crate::infra::services::auth::AuthService;

use async_trait::async_trait;
use marathon_core::console_prelude::AdminUser;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct StubAuthService {
    inner: Arc<RwLock<InnerAuthState>>,
}

#[derive(Debug, Clone)]
struct InnerAuthState {
    email: String,
    password: String,
    token: String,
    user: AdminUser,
    /// Token rejected by `/auth/me`, e.g. to model an expired session
    revoked: bool,
    me_calls: usize,
}

impl Default for StubAuthService {
    fn default() -> Self {
        Self::new()
    }
}

impl StubAuthService {
    pub fn new() -> Self {
        let user = AdminUser {
            id: "admin-1".into(),
            name: "Race Admin".into(),
            email: "admin@example.com".into(),
            role: Some("admin".into()),
            created_at: None,
        };

        Self {
            inner: Arc::new(RwLock::new(InnerAuthState {
                email: user.email.clone(),
                password: "secret".into(),
                token: "stub-token".into(),
                user,
                revoked: false,
                me_calls: 0,
            })),
        }
    }

    pub fn with_credentials(
        self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        {
            let mut guard = self.inner.write();
            guard.email = email.into();
            guard.password = password.into();
        }
        self
    }

    pub fn token(&self) -> AuthToken {
        AuthToken::new(self.inner.read().token.clone())
    }

    pub fn user(&self) -> AdminUser {
        self.inner.read().user.clone()
    }

    pub fn revoke(&self) {
        self.inner.write().revoked = true;
    }

    pub fn me_calls(&self) -> usize {
        self.inner.read().me_calls
    }
}

#[async_trait]
impl AuthService for StubAuthService {
    async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> ConsoleResult<AuthToken> {
        let guard = self.inner.read();
        if guard.email == email && guard.password == password {
            Ok(AuthToken::new(guard.token.clone()))
        } else {
            Err(ConsoleError::api(Some(401), "Invalid email or password"))
        }
    }

    async fn current_user(&self) -> ConsoleResult<AdminUser> {
        let mut guard = self.inner.write();
        guard.me_calls += 1;
        if guard.revoked {
            return Err(ConsoleError::Unauthorized);
        }
        Ok(guard.user.clone())
    }
}
