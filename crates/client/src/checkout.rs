//! Checkout orchestration.
//!
//! [`CheckoutOrchestrator`] drives cart -> order-creation -> payment
//! settlement as one logical transaction from the client's point of view.
//! The pipeline is strictly ordered: no step is attempted before its
//! predecessor has succeeded, and a failure halts the pipeline without
//! advancing the stage.
//!
//! The orchestrator survives restarts: its state can always be rebuilt from
//! `{is_authenticated, order_id}` plus a fresh [`CheckoutOrchestrator::load_order`]
//! call, which is how a payment page entered via reload or deep link
//! recovers.

use std::sync::{Arc, RwLock};

use thiserror::Error;

use retailcloud_core::{Email, Order, OrderId, PaymentAttempt, PaymentStatus, UserId};

use crate::api::{
    NotificationApi, OrderConfirmation, OrdersApi, PaymentApi, PaymentReceipt, PaymentRequest,
};
use crate::busy::BusyFlag;
use crate::cart::CartState;
use crate::session::SessionStore;

/// Errors that can occur while driving the checkout pipeline.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The caller is not authenticated; no remote call was made.
    #[error("sign in to check out")]
    AuthRequired,

    /// No order with the given id is known to the Orders service.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// Order creation failed; the pipeline stays before order creation.
    #[error("{0}")]
    CheckoutFailed(String),

    /// Payment settlement failed; the pipeline stays at the created order
    /// and retrying with the same order id is safe.
    #[error("{0}")]
    PaymentFailed(String),

    /// Another checkout operation is still outstanding.
    #[error("another checkout operation is in progress")]
    Busy,
}

/// Position in the checkout pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutStage {
    /// No order exists yet for this session.
    CartLoaded,
    /// An order exists and awaits payment.
    OrderCreated(OrderId),
    /// Payment has settled for the order.
    PaymentSettled(OrderId),
}

/// Driver of the cart -> order -> payment pipeline.
pub struct CheckoutOrchestrator {
    orders: Arc<dyn OrdersApi>,
    payments: Arc<dyn PaymentApi>,
    notifications: Arc<dyn NotificationApi>,
    session: Arc<SessionStore>,
    cart: Arc<CartState>,
    fallback_email: Email,
    stage: RwLock<CheckoutStage>,
    last_attempt: RwLock<Option<PaymentAttempt>>,
    busy: BusyFlag,
}

impl CheckoutOrchestrator {
    /// Create an orchestrator at the `CartLoaded` stage.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrdersApi>,
        payments: Arc<dyn PaymentApi>,
        notifications: Arc<dyn NotificationApi>,
        session: Arc<SessionStore>,
        cart: Arc<CartState>,
        fallback_email: Email,
    ) -> Self {
        Self {
            orders,
            payments,
            notifications,
            session,
            cart,
            fallback_email,
            stage: RwLock::new(CheckoutStage::CartLoaded),
            last_attempt: RwLock::new(None),
            busy: BusyFlag::new(),
        }
    }

    // =========================================================================
    // Pipeline steps
    // =========================================================================

    /// Convert the user's cart into an order.
    ///
    /// Requires an authenticated session; otherwise no remote call is made
    /// and the frontend is expected to redirect to login. On success the
    /// stage advances to `OrderCreated`, the local cart empties immediately,
    /// and the remote cart clear runs fire-and-forget relative to
    /// navigation. On failure the stage stays at `CartLoaded`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AuthRequired`], [`CheckoutError::Busy`], or
    /// [`CheckoutError::CheckoutFailed`] with the assembled user message.
    pub async fn checkout(&self, user: &UserId) -> Result<Order, CheckoutError> {
        let _guard = self.busy.try_acquire().ok_or(CheckoutError::Busy)?;

        if !self.session.is_logged_in() {
            return Err(CheckoutError::AuthRequired);
        }

        let email = self.checkout_email();
        let response = self
            .orders
            .checkout(user, &email)
            .await
            .map_err(|e| CheckoutError::CheckoutFailed(e.user_message("Checkout failed.")))?;

        let order = response.order;
        self.set_stage(CheckoutStage::OrderCreated(order.order_id.clone()));
        tracing::info!(order = %order.order_id, "Order created");

        // The cart is stale the moment the order exists: empty the local view
        // now, reconcile the server without waiting for it.
        self.cart.clear_local();
        let cart = Arc::clone(&self.cart);
        let user = user.clone();
        tokio::spawn(async move {
            if let Err(e) = cart.clear(&user).await {
                tracing::warn!(error = %e, "Post-checkout cart clear failed");
            }
        });

        Ok(order)
    }

    /// Re-entrant order lookup for a payment page entered directly.
    ///
    /// Fetches the full order list and linearly matches `order_id`; on a
    /// match the stage becomes `OrderCreated`, reconstructing the pipeline
    /// purely from server state.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OrderNotFound`] when no order matches and
    /// [`CheckoutError::CheckoutFailed`] when the list call itself fails.
    pub async fn load_order(
        &self,
        user: &UserId,
        order_id: &OrderId,
    ) -> Result<Order, CheckoutError> {
        let order = self
            .order_history(user)
            .await?
            .into_iter()
            .find(|order| &order.order_id == order_id)
            .ok_or_else(|| CheckoutError::OrderNotFound(order_id.clone()))?;

        self.set_stage(CheckoutStage::OrderCreated(order.order_id.clone()));
        Ok(order)
    }

    /// Fetch the user's order history.
    ///
    /// Read-only; the pipeline stage is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CheckoutFailed`] when the list call fails.
    pub async fn order_history(&self, user: &UserId) -> Result<Vec<Order>, CheckoutError> {
        let response = self.orders.list(user).await.map_err(|e| {
            CheckoutError::CheckoutFailed(e.user_message("Failed to load order details."))
        })?;
        Ok(response.items)
    }

    /// Settle payment for a previously created or loaded order.
    ///
    /// The outcome submitted to the payment service is always optimistic
    /// `SUCCESS`; true failure semantics are the collaborator's
    /// responsibility. The service is treated as idempotent per order id, so
    /// calling this again with the same id - including after it already
    /// settled - is safe. On failure the stage stays at `OrderCreated`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OrderNotFound`] when the order id was never
    /// created or loaded here, [`CheckoutError::Busy`] during an outstanding
    /// call, and [`CheckoutError::PaymentFailed`] when the payment service
    /// call fails.
    pub async fn pay(
        &self,
        user: &UserId,
        order_id: &OrderId,
    ) -> Result<PaymentReceipt, CheckoutError> {
        let _guard = self.busy.try_acquire().ok_or(CheckoutError::Busy)?;

        // Payment is never speculative: a concrete order id must have come
        // from checkout or load_order first.
        let known = {
            let stage = self.stage.read().expect("checkout stage lock poisoned");
            matches!(
                &*stage,
                CheckoutStage::OrderCreated(id) | CheckoutStage::PaymentSettled(id)
                    if id == order_id
            )
        };
        if !known {
            return Err(CheckoutError::OrderNotFound(order_id.clone()));
        }

        let request = PaymentRequest {
            order_id: order_id.clone(),
            status: PaymentStatus::Success,
        };
        match self.payments.pay(&request).await {
            Ok(receipt) => {
                self.set_stage(CheckoutStage::PaymentSettled(order_id.clone()));
                self.record_attempt(order_id, PaymentStatus::Success);
                self.notify_order_confirmed(user, &receipt);
                tracing::info!(order = %order_id, "Payment settled");
                Ok(receipt)
            }
            Err(e) => {
                self.record_attempt(order_id, PaymentStatus::Failed);
                self.notify_payment_failed(user, order_id);
                Err(CheckoutError::PaymentFailed(
                    e.user_message("Payment processing failed"),
                ))
            }
        }
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Current pipeline stage.
    #[must_use]
    pub fn stage(&self) -> CheckoutStage {
        self.stage
            .read()
            .expect("checkout stage lock poisoned")
            .clone()
    }

    /// The most recent payment attempt this session, if any.
    #[must_use]
    pub fn last_attempt(&self) -> Option<PaymentAttempt> {
        self.last_attempt
            .read()
            .expect("payment attempt lock poisoned")
            .clone()
    }

    /// Whether a checkout or payment call is currently outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.is_set()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Email for order confirmation, from the current identity.
    ///
    /// Falls back to the configured default when no identity or email claim
    /// is present - intentionally permissive for demo/guest flows.
    fn checkout_email(&self) -> Email {
        self.session
            .current_user()
            .and_then(|identity| identity.email)
            .and_then(|email| Email::parse(&email).ok())
            .unwrap_or_else(|| self.fallback_email.clone())
    }

    fn set_stage(&self, stage: CheckoutStage) {
        *self.stage.write().expect("checkout stage lock poisoned") = stage;
    }

    fn record_attempt(&self, order_id: &OrderId, outcome: PaymentStatus) {
        *self
            .last_attempt
            .write()
            .expect("payment attempt lock poisoned") = Some(PaymentAttempt {
            order_id: order_id.clone(),
            outcome,
        });
    }

    fn notify_order_confirmed(&self, user: &UserId, receipt: &PaymentReceipt) {
        let data = OrderConfirmation {
            email: self.checkout_email(),
            user_id: user.clone(),
            order_id: receipt.payment.order_id.clone(),
            amount: receipt.payment.amount,
            currency: receipt.payment.currency.clone(),
        };
        let notifications = Arc::clone(&self.notifications);
        tokio::spawn(async move {
            if let Err(e) = notifications.order_confirmed(&data).await {
                tracing::warn!(error = %e, "Failed to trigger order confirmation email");
            }
        });
    }

    fn notify_payment_failed(&self, user: &UserId, order_id: &OrderId) {
        let email = self.checkout_email();
        let user = user.clone();
        let order_id = order_id.clone();
        let notifications = Arc::clone(&self.notifications);
        tokio::spawn(async move {
            if let Err(e) = notifications.payment_failed(&email, &user, &order_id).await {
                tracing::warn!(error = %e, "Failed to trigger payment-failed email");
            }
        });
    }
}
