//! Orders service contract and HTTP client.
//!
//! Endpoints: `POST /orders/checkout`, `GET /orders`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use retailcloud_core::{Email, Order, UserId};

use super::{ApiClient, ApiError};

/// Response from `POST /orders/checkout`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutResponse {
    #[serde(default)]
    pub message: String,
    /// The order minted by the backend for this checkout.
    pub order: Order,
}

/// Response from `GET /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderListResponse {
    #[serde(default)]
    pub items: Vec<Order>,
}

/// Contract for the remote Orders service.
#[async_trait]
pub trait OrdersApi: Send + Sync {
    /// Convert the user's cart into an order.
    ///
    /// The confirmation email address travels in the request body.
    async fn checkout(&self, user: &UserId, email: &Email) -> Result<CheckoutResponse, ApiError>;

    /// Fetch the user's order history.
    async fn list(&self, user: &UserId) -> Result<OrderListResponse, ApiError>;
}

/// HTTP implementation of [`OrdersApi`].
#[derive(Clone)]
pub struct OrdersClient {
    api: ApiClient,
}

impl OrdersClient {
    /// Create a new orders client sharing the given API core.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl OrdersApi for OrdersClient {
    async fn checkout(&self, user: &UserId, email: &Email) -> Result<CheckoutResponse, ApiError> {
        let body = json!({ "email": email });
        self.api.post_json("/orders/checkout", &body, Some(user)).await
    }

    async fn list(&self, user: &UserId) -> Result<OrderListResponse, ApiError> {
        self.api.get_json("/orders", Some(user)).await
    }
}
