//! Cart state.
//!
//! [`CartState`] owns the local view of the user's cart lines and a derived
//! item-count broadcast for badges and summaries. The remote cart service is
//! the source of truth - multiple tabs and sessions may share one user id -
//! so the local copy is a cache that reconciles against the server after
//! every mutation instead of trusting optimistic arithmetic.

use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::watch;

use retailcloud_core::{CartLine, ProductId, UserId, cart_item_count, cart_total};

use crate::api::{CartApi, CartPayload, NewCartItem};
use crate::busy::BusyFlag;

/// Errors that can occur when synchronizing the cart.
#[derive(Debug, Error)]
pub enum CartSyncError {
    /// The remote cart call failed.
    ///
    /// Carries the user-facing message assembled from the richest available
    /// error payload.
    #[error("{0}")]
    Remote(String),

    /// Another cart mutation is still outstanding.
    #[error("another cart operation is in progress")]
    Busy,
}

/// Collapse the cart service's heterogeneous payload shapes into the
/// canonical line list.
///
/// The upstream service answers with a bare list, `{items: [...]}` or
/// `{cartItems: [...]}` depending on the code path; anything else counts as
/// an empty cart. Lines without any product id are dropped. This is the only
/// place that knows about the inconsistency - a stabilized upstream contract
/// replaces this one function.
#[must_use]
pub fn normalize(payload: CartPayload) -> Vec<CartLine> {
    let wire = match payload {
        CartPayload::Lines(lines) => lines,
        CartPayload::Items { items } => items,
        CartPayload::CartItems { cart_items } => cart_items,
        CartPayload::Other(_) => Vec::new(),
    };

    wire.into_iter()
        .filter_map(|line| {
            let product_id = line.product_id?;
            Some(CartLine {
                product_id,
                name: line.name.unwrap_or_default(),
                unit_price: line.price.unwrap_or_default(),
                quantity: line.qty.unwrap_or(0),
            })
        })
        .collect()
}

/// Owner of the local cart view.
pub struct CartState {
    api: Arc<dyn CartApi>,
    lines: RwLock<Vec<CartLine>>,
    count_tx: watch::Sender<u32>,
    busy: BusyFlag,
}

impl CartState {
    /// Create an empty cart state.
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>) -> Self {
        let (count_tx, _) = watch::channel(0);
        Self {
            api,
            lines: RwLock::new(Vec::new()),
            count_tx,
            busy: BusyFlag::new(),
        }
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// Fetch the remote cart and replace the local line list.
    ///
    /// On failure the previous lines stay untouched but the count broadcast
    /// drops to zero, so a badge never shows stale numbers after a known
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`CartSyncError::Remote`] when the cart service call fails.
    pub async fn load(&self, user: &UserId) -> Result<(), CartSyncError> {
        match self.api.get(user).await {
            Ok(payload) => {
                let lines = normalize(payload);
                let count = cart_item_count(&lines);
                *self.lines.write().expect("cart lines lock poisoned") = lines;
                self.count_tx.send_replace(count);
                Ok(())
            }
            Err(e) => {
                self.count_tx.send_replace(0);
                Err(CartSyncError::Remote(
                    e.user_message("Failed to load cart."),
                ))
            }
        }
    }

    /// Add an item, then reload the full cart.
    ///
    /// The count broadcast reflects server truth after the reload - there is
    /// no dual bookkeeping of client-side arithmetic.
    ///
    /// # Errors
    ///
    /// Returns [`CartSyncError::Busy`] while another mutation is outstanding
    /// and [`CartSyncError::Remote`] when a cart service call fails.
    pub async fn add_item(
        &self,
        user: &UserId,
        product: &ProductId,
        qty: u32,
        price: Decimal,
    ) -> Result<(), CartSyncError> {
        let _guard = self.busy.try_acquire().ok_or(CartSyncError::Busy)?;

        let item = NewCartItem {
            product_id: product.clone(),
            qty,
            price,
        };
        self.api
            .add_item(user, &item)
            .await
            .map_err(|e| CartSyncError::Remote(e.user_message("Failed to add item.")))?;

        self.load(user).await
    }

    /// Remove a line.
    ///
    /// The line disappears from the local list immediately (no full reload),
    /// then the count is refreshed from the server to stay eventually
    /// consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CartSyncError::Busy`] while another mutation is outstanding
    /// and [`CartSyncError::Remote`] when the remove call fails.
    pub async fn remove_item(
        &self,
        user: &UserId,
        product: &ProductId,
    ) -> Result<(), CartSyncError> {
        let _guard = self.busy.try_acquire().ok_or(CartSyncError::Busy)?;

        self.api
            .remove_item(user, product)
            .await
            .map_err(|e| CartSyncError::Remote(e.user_message("Failed to remove item.")))?;

        self.lines
            .write()
            .expect("cart lines lock poisoned")
            .retain(|line| &line.product_id != product);
        self.refresh_count(user).await;

        Ok(())
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns [`CartSyncError::Busy`] while another mutation is outstanding
    /// and [`CartSyncError::Remote`] when the clear call fails.
    pub async fn clear(&self, user: &UserId) -> Result<(), CartSyncError> {
        let _guard = self.busy.try_acquire().ok_or(CartSyncError::Busy)?;

        self.api
            .clear(user)
            .await
            .map_err(|e| CartSyncError::Remote(e.user_message("Failed to clear cart.")))?;

        self.clear_local();
        Ok(())
    }

    /// Change a line's quantity by removing and re-adding it.
    ///
    /// # Errors
    ///
    /// Returns [`CartSyncError::Busy`] while another mutation is outstanding
    /// and [`CartSyncError::Remote`] when either step fails.
    pub async fn update_qty(
        &self,
        user: &UserId,
        product: &ProductId,
        qty: u32,
        price: Decimal,
    ) -> Result<(), CartSyncError> {
        self.remove_item(user, product).await?;
        self.add_item(user, product, qty, price).await
    }

    /// Forget the local cart contents without a remote call.
    ///
    /// Used when the cart is known stale, e.g. right after checkout converted
    /// it into an order.
    pub fn clear_local(&self) {
        self.lines
            .write()
            .expect("cart lines lock poisoned")
            .clear();
        self.count_tx.send_replace(0);
    }

    /// Count-only reconcile against the server; failures drop the count to
    /// zero like a failed load.
    async fn refresh_count(&self, user: &UserId) {
        match self.api.get(user).await {
            Ok(payload) => {
                let lines = normalize(payload);
                self.count_tx.send_replace(cart_item_count(&lines));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cart count refresh failed");
                self.count_tx.send_replace(0);
            }
        }
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Snapshot of the current line list.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines
            .read()
            .expect("cart lines lock poisoned")
            .clone()
    }

    /// Derived cart total over the current lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        cart_total(&self.lines())
    }

    /// Current value of the item-count broadcast.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        *self.count_tx.borrow()
    }

    /// Subscribe to item-count changes.
    ///
    /// Every observer sees the same value without re-querying the cart
    /// service.
    #[must_use]
    pub fn subscribe_count(&self) -> watch::Receiver<u32> {
        self.count_tx.subscribe()
    }

    /// Whether a mutation is currently outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.is_set()
    }
}
