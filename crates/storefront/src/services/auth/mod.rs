//! External auth provider client.
//!
//! Token issuance is fully delegated: the storefront exchanges credentials
//! for a bearer token at sign-in and validates it against the provider's
//! session endpoint. No credentials are stored locally.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use velora_core::UserId;

use crate::config::AuthProviderConfig;

/// A user record as returned by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A live session as returned by sign-in/sign-up.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

/// The session endpoint's payload when a token is valid.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Client for the external auth provider.
///
/// Cheaply cloneable; all clones share the HTTP connection pool.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

struct AuthClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    /// Create a new auth provider client.
    #[must_use]
    pub fn new(config: &AuthProviderConfig) -> Self {
        Self {
            inner: Arc::new(AuthClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the provider rejects the pair, or a
    /// transport/provider error otherwise.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .inner
            .client
            .post(self.url("/sign-in/email"))
            .json(&CredentialsRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidCredentials);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Provider {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` when the address is already registered, or a
    /// transport/provider error otherwise.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let response = self
            .inner
            .client
            .post(self.url("/sign-up/email"))
            .json(&SignUpRequest {
                name,
                email,
                password,
            })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::CONFLICT
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            return Err(AuthError::EmailTaken);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Provider {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Invalidate a session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable; an already-expired
    /// token is not an error.
    #[instrument(skip(self, token))]
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let response = self
            .inner
            .client
            .post(self.url("/sign-out"))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        let body = response.text().await?;
        Err(AuthError::Provider {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        })
    }

    /// Look up the session behind a token.
    ///
    /// Returns `Ok(None)` when the token is expired or unknown - the
    /// provider responds with `null` (or 401) in that case.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport or provider failures.
    #[instrument(skip(self, token))]
    pub async fn get_session(&self, token: &str) -> Result<Option<SessionInfo>, AuthError> {
        let response = self
            .inner
            .client
            .get(self.url("/get-session"))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Provider {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        // The provider returns a JSON `null` body for missing sessions
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_info_null_body_is_none() {
        let info: Option<SessionInfo> = serde_json::from_str("null").unwrap();
        assert!(info.is_none());
    }

    #[test]
    fn test_auth_session_deserializes() {
        let json = r#"{
            "token": "tok_123",
            "user": { "id": "user-1", "email": "dana@example.com", "name": "Dana" }
        }"#;
        let session: AuthSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.token, "tok_123");
        assert_eq!(session.user.id.as_str(), "user-1");
        assert_eq!(session.user.name.as_deref(), Some("Dana"));
    }

    #[test]
    fn test_auth_user_name_optional() {
        let json = r#"{ "id": "user-1", "email": "dana@example.com" }"#;
        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert!(user.name.is_none());
    }
}
