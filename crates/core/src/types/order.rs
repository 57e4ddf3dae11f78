//! Order and payment-attempt types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::cart::CartLine;
use crate::types::id::OrderId;
use crate::types::status::{OrderStatus, PaymentStatus};

/// An order created by the Orders service on checkout.
///
/// The client never fabricates an `order_id`; it only carries ids minted by
/// the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Backend-assigned order identifier.
    pub order_id: OrderId,
    /// Current lifecycle status.
    #[serde(default)]
    pub status: OrderStatus,
    /// Line items captured at checkout time.
    #[serde(default)]
    pub items: Vec<CartLine>,
    /// Total amount as computed by the backend.
    #[serde(default)]
    pub total_amount: Decimal,
}

/// One payment attempt against an order.
///
/// Ephemeral: kept for the current session only, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAttempt {
    /// The order the attempt was made against.
    pub order_id: OrderId,
    /// Reported outcome.
    pub outcome: PaymentStatus,
}
