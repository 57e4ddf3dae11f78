//! RetailCloud service collaborators.
//!
//! # Architecture
//!
//! Each remote collaborator (auth, cart, orders, payments, notifications) is
//! an `async_trait` contract plus a reqwest-backed implementation. All HTTP
//! implementations share one [`ApiClient`] that owns the base URL, the
//! `userId` query parameter convention, and response/error decoding.
//!
//! The contracts exist so the coordination components ([`crate::session`],
//! [`crate::cart`], [`crate::checkout`]) can be exercised against in-process
//! stubs; nothing above this module knows about HTTP.

mod auth;
mod cart;
mod notifications;
mod orders;
mod payment;

pub use auth::{AuthApi, AuthClient, ConfirmResponse, LoginResponse, RegisterResponse, TokenBundle};
pub use cart::{CartApi, CartClient, CartPayload, NewCartItem, WireCartLine};
pub use notifications::{
    NotificationApi, NotificationClient, NotificationResponse, OrderConfirmation,
};
pub use orders::{CheckoutResponse, OrderListResponse, OrdersApi, OrdersClient};
pub use payment::{
    OrderUpdate, PaymentApi, PaymentClient, PaymentReceipt, PaymentRecord, PaymentRequest,
};

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use retailcloud_core::UserId;

/// Errors that can occur when calling a RetailCloud service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed before a response was produced.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the raw body when none was found.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Assemble a user-facing message.
    ///
    /// Checks, in order: a structured server-provided message, then the
    /// transport-level message, then the caller's hardcoded fallback.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            Self::Http(e) => e.to_string(),
            Self::Api { .. } | Self::Parse(_) => fallback.to_owned(),
        }
    }
}

/// Extract a structured `message` field from an error body, if present.
fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(ToOwned::to_owned)
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared HTTP core
// ─────────────────────────────────────────────────────────────────────────────

/// Low-level HTTP client for the RetailCloud API.
///
/// Cheaply cloneable via `Arc`; the collaborator clients each hold a clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given base URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
            }),
        }
    }

    /// The configured base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        user: Option<&UserId>,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.http.get(self.url(path));
        if let Some(user) = user {
            request = request.query(&[("userId", user.as_str())]);
        }
        Self::execute(request).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        user: Option<&UserId>,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.http.post(self.url(path)).json(body);
        if let Some(user) = user {
            request = request.query(&[("userId", user.as_str())]);
        }
        Self::execute(request).await
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(
        &self,
        path: &str,
        user: Option<&UserId>,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.http.delete(self.url(path));
        if let Some(user) = user {
            request = request.query(&[("userId", user.as_str())]);
        }
        Self::execute(request).await
    }

    /// Send a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = server_message(&text).unwrap_or(text);
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}
