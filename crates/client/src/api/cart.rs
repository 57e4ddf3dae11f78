//! Cart service contract and HTTP client.
//!
//! Endpoints: `GET /cart`, `POST /cart/items`,
//! `DELETE /cart/items/{productId}`, `DELETE /cart`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use retailcloud_core::{ProductId, UserId};

use super::{ApiClient, ApiError};

/// A cart line as the cart service sends it.
///
/// The upstream service is inconsistent about field names (`productId` vs
/// `id`, `name` vs `title`) and may omit prices and quantities; everything is
/// optional here and [`crate::cart::normalize`] fills the gaps.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCartLine {
    #[serde(alias = "id", default)]
    pub product_id: Option<ProductId>,
    #[serde(alias = "title", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub qty: Option<u32>,
}

/// Payload returned by `GET /cart`.
///
/// The upstream service answers with one of three shapes: a bare list, an
/// object with an `items` field, or an object with a `cartItems` field.
/// Anything else is treated as an empty cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CartPayload {
    Lines(Vec<WireCartLine>),
    Items { items: Vec<WireCartLine> },
    CartItems {
        #[serde(rename = "cartItems")]
        cart_items: Vec<WireCartLine>,
    },
    Other(serde_json::Value),
}

/// Request body for `POST /cart/items`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub qty: u32,
    pub price: Decimal,
}

/// Contract for the remote Cart service.
///
/// The cart service is the source of truth for a user's cart; callers
/// re-fetch after mutations instead of trusting local arithmetic.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the current cart for a user.
    async fn get(&self, user: &UserId) -> Result<CartPayload, ApiError>;

    /// Add an item (or increase its quantity).
    async fn add_item(&self, user: &UserId, item: &NewCartItem) -> Result<(), ApiError>;

    /// Remove a line entirely.
    async fn remove_item(&self, user: &UserId, product: &ProductId) -> Result<(), ApiError>;

    /// Remove every line.
    async fn clear(&self, user: &UserId) -> Result<(), ApiError>;
}

/// HTTP implementation of [`CartApi`].
#[derive(Clone)]
pub struct CartClient {
    api: ApiClient,
}

impl CartClient {
    /// Create a new cart client sharing the given API core.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CartApi for CartClient {
    async fn get(&self, user: &UserId) -> Result<CartPayload, ApiError> {
        self.api.get_json("/cart", Some(user)).await
    }

    async fn add_item(&self, user: &UserId, item: &NewCartItem) -> Result<(), ApiError> {
        let _: serde_json::Value = self.api.post_json("/cart/items", item, Some(user)).await?;
        Ok(())
    }

    async fn remove_item(&self, user: &UserId, product: &ProductId) -> Result<(), ApiError> {
        let path = format!("/cart/items/{product}");
        let _: serde_json::Value = self.api.delete_json(&path, Some(user)).await?;
        Ok(())
    }

    async fn clear(&self, user: &UserId) -> Result<(), ApiError> {
        let _: serde_json::Value = self.api.delete_json("/cart", Some(user)).await?;
        Ok(())
    }
}
