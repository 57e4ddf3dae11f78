//! Auth service contract and HTTP client.
//!
//! Endpoints: `POST /auth/register`, `POST /auth/confirm`,
//! `POST /auth/login`, `POST /auth/logout`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use retailcloud_core::Email;

use super::{ApiClient, ApiError};

/// The credential bundle issued on a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    /// Bearer token for API requests.
    pub access_token: String,
    /// Identity token carrying the signed claims payload.
    pub id_token: String,
    /// Token for obtaining fresh credentials.
    pub refresh_token: String,
    /// Credential lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Token scheme, normally `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Response from `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub tokens: TokenBundle,
}

/// Response from `POST /auth/register`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    /// Whether the account is usable immediately or needs a confirmation code.
    pub user_confirmed: bool,
    /// Backend-assigned subject identifier for the new account.
    pub user_sub: String,
}

/// Response from `POST /auth/confirm`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmResponse {
    #[serde(default)]
    pub message: String,
}

/// Contract for the remote Auth service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Create a new account.
    async fn register(&self, email: &Email, password: &str) -> Result<RegisterResponse, ApiError>;

    /// Confirm a freshly registered account with an emailed code.
    async fn confirm(&self, email: &Email, code: &str) -> Result<ConfirmResponse, ApiError>;

    /// Exchange credentials for a token bundle.
    async fn login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError>;

    /// Invalidate the server-side session.
    async fn logout(&self) -> Result<(), ApiError>;
}

/// HTTP implementation of [`AuthApi`].
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    /// Create a new auth client sharing the given API core.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn register(&self, email: &Email, password: &str) -> Result<RegisterResponse, ApiError> {
        let body = json!({ "email": email, "password": password });
        self.api.post_json("/auth/register", &body, None).await
    }

    async fn confirm(&self, email: &Email, code: &str) -> Result<ConfirmResponse, ApiError> {
        let body = json!({ "email": email, "code": code });
        self.api.post_json("/auth/confirm", &body, None).await
    }

    async fn login(&self, email: &Email, password: &str) -> Result<LoginResponse, ApiError> {
        let body = json!({ "email": email, "password": password });
        self.api.post_json("/auth/login", &body, None).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        // Response body is ignored; only the status matters.
        let _: serde_json::Value = self.api.post_json("/auth/logout", &json!({}), None).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_wire_shape() {
        let json = r#"{
            "message": "Login successful",
            "tokens": {
                "accessToken": "at",
                "idToken": "it",
                "refreshToken": "rt",
                "expiresIn": 3600,
                "tokenType": "Bearer"
            }
        }"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.tokens.access_token, "at");
        assert_eq!(response.tokens.expires_in, Some(3600));
    }

    #[test]
    fn test_register_response_wire_shape() {
        let json = r#"{"message":"ok","userConfirmed":false,"userSub":"u-123"}"#;
        let response: RegisterResponse = serde_json::from_str(json).unwrap();
        assert!(!response.user_confirmed);
        assert_eq!(response.user_sub, "u-123");
    }
}
