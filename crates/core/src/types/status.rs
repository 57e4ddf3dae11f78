//! Status enums for orders and payments.

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the Orders service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created but not yet paid.
    #[default]
    Pending,
    /// Payment settled.
    Confirmed,
    /// Payment or fulfillment failed.
    Failed,
}

/// Outcome reported to the Payment service for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Payment settled.
    Success,
    /// Payment failed.
    Failed,
}
