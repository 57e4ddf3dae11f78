//! Payment service contract and HTTP client.
//!
//! Endpoints: `POST /payments`, `GET /payments/{paymentId}`.
//!
//! The deployed payment backend is a stub that settles every attempt; the
//! client submits an optimistic `SUCCESS` outcome and treats the service as
//! idempotent per order id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use retailcloud_core::{OrderId, OrderStatus, PaymentId, PaymentStatus, UserId};

use super::{ApiClient, ApiError};

/// Request body for `POST /payments`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub status: PaymentStatus,
}

/// The settled payment record inside a [`PaymentReceipt`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub provider: String,
    /// RFC 3339 timestamp string as sent by the service.
    #[serde(default)]
    pub created_at: String,
}

impl PaymentRecord {
    /// Parse the `created_at` timestamp.
    #[must_use]
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Order status change applied by the payment service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Response from `POST /payments`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    #[serde(default)]
    pub message: String,
    pub payment: PaymentRecord,
    pub order_update: OrderUpdate,
    /// Present only when a failed payment released reserved inventory.
    #[serde(default)]
    pub inventory_release: Option<serde_json::Value>,
}

/// Contract for the remote Payment service.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// Settle payment for an order.
    async fn pay(&self, request: &PaymentRequest) -> Result<PaymentReceipt, ApiError>;

    /// Look up a previously settled payment.
    async fn get_payment(&self, payment: &PaymentId) -> Result<serde_json::Value, ApiError>;
}

/// HTTP implementation of [`PaymentApi`].
#[derive(Clone)]
pub struct PaymentClient {
    api: ApiClient,
}

impl PaymentClient {
    /// Create a new payment client sharing the given API core.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PaymentApi for PaymentClient {
    async fn pay(&self, request: &PaymentRequest) -> Result<PaymentReceipt, ApiError> {
        self.api.post_json("/payments", request, None).await
    }

    async fn get_payment(&self, payment: &PaymentId) -> Result<serde_json::Value, ApiError> {
        let path = format!("/payments/{payment}");
        self.api.get_json(&path, None).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_request_wire_shape() {
        let request = PaymentRequest {
            order_id: OrderId::new("O-1"),
            status: PaymentStatus::Success,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["orderId"], "O-1");
        assert_eq!(json["status"], "SUCCESS");
    }

    #[test]
    fn test_receipt_wire_shape() {
        let json = r#"{
            "message": "Payment processed",
            "payment": {
                "paymentId": "PAY-1",
                "orderId": "O-1",
                "userId": "demo-user",
                "amount": 19.98,
                "currency": "USD",
                "status": "SUCCESS",
                "provider": "COD",
                "createdAt": "2025-03-01T12:00:00Z"
            },
            "orderUpdate": {"orderId": "O-1", "status": "CONFIRMED"}
        }"#;
        let receipt: PaymentReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.payment.payment_id.as_str(), "PAY-1");
        assert_eq!(receipt.order_update.status, OrderStatus::Confirmed);
        assert!(receipt.payment.created_at_datetime().is_some());
        assert!(receipt.inventory_release.is_none());
    }
}
