use crate::domains::auth::state_types::AuthToken;
use crate::infra::api_client::ApiClient;
use crate::infra::errors::{ConsoleError, ConsoleResult};

use async_trait::async_trait;
use marathon_core::console_prelude::{
    AdminUser, LoginRequest, LoginResponse, v1,
};
use std::fmt::Debug;
use std::sync::Arc;

#[async_trait]
pub trait AuthService: Send + Sync + Debug {
    /// Exchange credentials for a bearer token
    async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> ConsoleResult<AuthToken>;

    /// Load the account behind the session's current token
    async fn current_user(&self) -> ConsoleResult<AdminUser>;
}

#[derive(Debug, Clone)]
pub struct AuthApiAdapter {
    client: Arc<ApiClient>,
}

impl AuthApiAdapter {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthService for AuthApiAdapter {
    async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> ConsoleResult<AuthToken> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .client
            .post_public(v1::auth::LOGIN, &request)
            .await
            .map_err(|err| match err {
                ConsoleError::Unauthorized => {
                    ConsoleError::api(Some(401), "Invalid email or password")
                }
                other => other,
            })?;

        token_from_login(response)
    }

    async fn current_user(&self) -> ConsoleResult<AdminUser> {
        if self.client.session().token().is_none() {
            return Err(ConsoleError::NotAuthenticated);
        }
        self.client.get(v1::auth::ME).await
    }
}

fn token_from_login(response: LoginResponse) -> ConsoleResult<AuthToken> {
    match response.token {
        Some(token) if response.success && !token.is_empty() => {
            Ok(AuthToken::new(token))
        }
        _ => Err(ConsoleError::api(
            None,
            response
                .message
                .or(response.error)
                .unwrap_or_else(|| "Login failed".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_login_yields_token() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"success": true, "token": "abc"}"#)
                .unwrap();
        assert_eq!(token_from_login(response).unwrap().as_str(), "abc");
    }

    #[test]
    fn rejected_login_surfaces_server_message() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"success": false, "message": "Account disabled"}"#,
        )
        .unwrap();
        assert_eq!(
            token_from_login(response).unwrap_err(),
            ConsoleError::api(None, "Account disabled")
        );
    }

    #[test]
    fn success_without_token_is_still_a_failure() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(token_from_login(response).is_err());
    }
}
