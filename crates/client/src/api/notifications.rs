//! Notification service contract and HTTP client.
//!
//! Endpoints: `POST /notifications/order-confirmed`,
//! `POST /notifications/user-registered`, `POST /notifications/payment-failed`.
//!
//! This collaborator is fire-and-forget: callers log failures and never
//! surface them to the user.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use retailcloud_core::{Email, OrderId, UserId};

use super::{ApiClient, ApiError};

/// Payload for an order-confirmed email.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub email: Email,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub currency: String,
}

/// Response from the notification endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub to_email: String,
}

/// Contract for the remote Notification service.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Trigger an order-confirmation email.
    async fn order_confirmed(
        &self,
        data: &OrderConfirmation,
    ) -> Result<NotificationResponse, ApiError>;

    /// Trigger a welcome email for a new account.
    async fn user_registered(
        &self,
        email: &Email,
        user: &UserId,
    ) -> Result<NotificationResponse, ApiError>;

    /// Trigger a payment-failed email.
    async fn payment_failed(
        &self,
        email: &Email,
        user: &UserId,
        order: &OrderId,
    ) -> Result<NotificationResponse, ApiError>;
}

/// HTTP implementation of [`NotificationApi`].
#[derive(Clone)]
pub struct NotificationClient {
    api: ApiClient,
}

impl NotificationClient {
    /// Create a new notification client sharing the given API core.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl NotificationApi for NotificationClient {
    async fn order_confirmed(
        &self,
        data: &OrderConfirmation,
    ) -> Result<NotificationResponse, ApiError> {
        self.api
            .post_json("/notifications/order-confirmed", data, None)
            .await
    }

    async fn user_registered(
        &self,
        email: &Email,
        user: &UserId,
    ) -> Result<NotificationResponse, ApiError> {
        let body = json!({ "email": email, "userId": user });
        self.api
            .post_json("/notifications/user-registered", &body, None)
            .await
    }

    async fn payment_failed(
        &self,
        email: &Email,
        user: &UserId,
        order: &OrderId,
    ) -> Result<NotificationResponse, ApiError> {
        let body = json!({ "email": email, "userId": user, "orderId": order });
        self.api
            .post_json("/notifications/payment-failed", &body, None)
            .await
    }
}
