//! Scenario test support for the RetailCloud client.
//!
//! Hosts in-process stub collaborators and a credential builder so the tests
//! in `tests/` run hermetically - no network, no live backend. The stubs
//! implement the same contracts the HTTP clients do, so everything above the
//! collaborator boundary runs exactly as it would in production.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;

use retailcloud_client::api::{
    ApiError, AuthApi, CartApi, CartPayload, CheckoutResponse, ConfirmResponse, LoginResponse,
    NewCartItem, NotificationApi, NotificationResponse, OrderConfirmation, OrderListResponse,
    OrderUpdate, OrdersApi, PaymentApi, PaymentReceipt, PaymentRecord, PaymentRequest,
    RegisterResponse, TokenBundle,
};
use retailcloud_core::{Email, Order, OrderId, OrderStatus, PaymentId, ProductId, UserId};

/// A server-style error with a structured message.
#[must_use]
pub fn remote_error(message: &str) -> ApiError {
    ApiError::Api {
        status: 500,
        message: message.to_owned(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Credential builder
// ─────────────────────────────────────────────────────────────────────────────

/// Build an identity token around the given claims.
///
/// The signature segment is garbage; the client never verifies it.
#[must_use]
pub fn identity_token(sub: &str, email: Option<&str>, exp: i64) -> String {
    let mut claims = json!({ "sub": sub, "exp": exp });
    if let Some(email) = email {
        claims["email"] = json!(email);
        claims["email_verified"] = json!(true);
    }
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    format!("eyJhbGciOiJSUzI1NiJ9.{payload}.c2lnbmF0dXJl")
}

/// An expiry one hour in the future.
#[must_use]
pub fn future_exp() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

/// An expiry one hour in the past.
#[must_use]
pub fn past_exp() -> i64 {
    chrono::Utc::now().timestamp() - 3600
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth stub
// ─────────────────────────────────────────────────────────────────────────────

/// Stub auth service issuing a fixed identity token.
pub struct StubAuth {
    pub id_token: String,
    pub fail_login: AtomicBool,
    pub fail_logout: AtomicBool,
    pub user_confirmed: bool,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl StubAuth {
    /// A stub that logs every caller in with the given identity token.
    #[must_use]
    pub fn issuing(id_token: impl Into<String>) -> Self {
        Self {
            id_token: id_token.into(),
            fail_login: AtomicBool::new(false),
            fail_logout: AtomicBool::new(false),
            user_confirmed: false,
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AuthApi for StubAuth {
    async fn register(
        &self,
        _email: &Email,
        _password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        Ok(RegisterResponse {
            message: "Registration successful".to_owned(),
            user_confirmed: self.user_confirmed,
            user_sub: "u-new".to_owned(),
        })
    }

    async fn confirm(&self, _email: &Email, _code: &str) -> Result<ConfirmResponse, ApiError> {
        Ok(ConfirmResponse {
            message: "Confirmed".to_owned(),
        })
    }

    async fn login(&self, _email: &Email, _password: &str) -> Result<LoginResponse, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_login.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 401,
                message: "Invalid credentials".to_owned(),
            });
        }
        Ok(LoginResponse {
            message: "Login successful".to_owned(),
            tokens: TokenBundle {
                access_token: "stub-access-token".to_owned(),
                id_token: self.id_token.clone(),
                refresh_token: "stub-refresh-token".to_owned(),
                expires_in: Some(3600),
                token_type: Some("Bearer".to_owned()),
            },
        })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(remote_error("logout endpoint unavailable"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cart stub
// ─────────────────────────────────────────────────────────────────────────────

/// Which of the three upstream response shapes the stub serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartShape {
    /// A bare JSON list.
    Bare,
    /// `{"items": [...]}`
    Items,
    /// `{"cartItems": [...]}`
    CartItems,
}

/// Stub cart service holding server-side line state.
pub struct StubCart {
    shape: Mutex<CartShape>,
    lines: Mutex<Vec<serde_json::Value>>,
    pub fail_get: AtomicBool,
    pub mutation_delay: Mutex<Option<Duration>>,
    pub get_calls: AtomicUsize,
    pub add_calls: AtomicUsize,
    pub remove_calls: AtomicUsize,
    pub clear_calls: AtomicUsize,
}

impl StubCart {
    /// An empty cart served in the given shape.
    #[must_use]
    pub fn empty(shape: CartShape) -> Self {
        Self {
            shape: Mutex::new(shape),
            lines: Mutex::new(Vec::new()),
            fail_get: AtomicBool::new(false),
            mutation_delay: Mutex::new(None),
            get_calls: AtomicUsize::new(0),
            add_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            clear_calls: AtomicUsize::new(0),
        }
    }

    /// Seed the server-side cart with raw line values.
    pub fn seed(&self, lines: Vec<serde_json::Value>) {
        *self.lines.lock().unwrap() = lines;
    }

    /// Switch the served response shape.
    pub fn set_shape(&self, shape: CartShape) {
        *self.shape.lock().unwrap() = shape;
    }

    /// Number of lines currently held server-side.
    #[must_use]
    pub fn server_len(&self) -> usize {
        self.lines.lock().unwrap().len()
    }

    async fn maybe_delay(&self) {
        let delay = *self.mutation_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CartApi for StubCart {
    async fn get(&self, _user: &UserId) -> Result<CartPayload, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(remote_error("cart service unavailable"));
        }

        let lines = self.lines.lock().unwrap().clone();
        let payload = match *self.shape.lock().unwrap() {
            CartShape::Bare => json!(lines),
            CartShape::Items => json!({ "items": lines }),
            CartShape::CartItems => json!({ "cartItems": lines }),
        };
        serde_json::from_value(payload).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn add_item(&self, _user: &UserId, item: &NewCartItem) -> Result<(), ApiError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_delay().await;

        let mut lines = self.lines.lock().unwrap();
        let existing = lines
            .iter_mut()
            .find(|line| line["productId"] == json!(item.product_id.as_str()));
        match existing {
            Some(line) => {
                let qty = line["qty"].as_u64().unwrap_or(0) + u64::from(item.qty);
                line["qty"] = json!(qty);
            }
            None => lines.push(json!({
                "productId": item.product_id.as_str(),
                "name": item.product_id.as_str(),
                "price": item.price,
                "qty": item.qty,
            })),
        }
        Ok(())
    }

    async fn remove_item(&self, _user: &UserId, product: &ProductId) -> Result<(), ApiError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_delay().await;

        self.lines
            .lock()
            .unwrap()
            .retain(|line| line["productId"] != json!(product.as_str()));
        Ok(())
    }

    async fn clear(&self, _user: &UserId) -> Result<(), ApiError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_delay().await;

        self.lines.lock().unwrap().clear();
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders stub
// ─────────────────────────────────────────────────────────────────────────────

/// Stub orders service with a fixed order book.
pub struct StubOrders {
    pub orders: Mutex<Vec<Order>>,
    pub next_order: Mutex<Option<Order>>,
    pub fail_checkout: AtomicBool,
    pub checkout_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub last_checkout_email: Mutex<Option<String>>,
}

impl StubOrders {
    /// A stub with an empty order book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            next_order: Mutex::new(None),
            fail_checkout: AtomicBool::new(false),
            checkout_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            last_checkout_email: Mutex::new(None),
        }
    }

    /// A stub whose order book already holds the given orders.
    #[must_use]
    pub fn with_orders(orders: Vec<Order>) -> Self {
        let stub = Self::new();
        *stub.orders.lock().unwrap() = orders;
        stub
    }

    /// Queue the order the next checkout call will mint.
    pub fn mint_on_checkout(&self, order: Order) {
        *self.next_order.lock().unwrap() = Some(order);
    }
}

impl Default for StubOrders {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrdersApi for StubOrders {
    async fn checkout(&self, _user: &UserId, email: &Email) -> Result<CheckoutResponse, ApiError> {
        self.checkout_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_checkout_email.lock().unwrap() = Some(email.as_str().to_owned());

        if self.fail_checkout.load(Ordering::SeqCst) {
            return Err(remote_error("order creation failed"));
        }

        let order = self
            .next_order
            .lock()
            .unwrap()
            .clone()
            .expect("stub has no order queued for checkout");
        self.orders.lock().unwrap().push(order.clone());

        Ok(CheckoutResponse {
            message: "Order created".to_owned(),
            order,
        })
    }

    async fn list(&self, _user: &UserId) -> Result<OrderListResponse, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(OrderListResponse {
            items: self.orders.lock().unwrap().clone(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment stub
// ─────────────────────────────────────────────────────────────────────────────

/// Stub payment service, idempotent per order id like the real one.
pub struct StubPayments {
    pub fail: AtomicBool,
    pub delay: Mutex<Option<Duration>>,
    pub pay_calls: AtomicUsize,
}

impl StubPayments {
    /// A stub that settles every attempt.
    #[must_use]
    pub fn settling() -> Self {
        Self {
            fail: AtomicBool::new(false),
            delay: Mutex::new(None),
            pay_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentApi for StubPayments {
    async fn pay(&self, request: &PaymentRequest) -> Result<PaymentReceipt, ApiError> {
        self.pay_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(remote_error("payment gateway unavailable"));
        }

        Ok(PaymentReceipt {
            message: "Payment processed".to_owned(),
            payment: PaymentRecord {
                payment_id: PaymentId::new(format!("PAY-{}", request.order_id)),
                order_id: request.order_id.clone(),
                user_id: UserId::new("demo-user"),
                amount: "19.98".parse().unwrap(),
                currency: "USD".to_owned(),
                status: "SUCCESS".to_owned(),
                provider: "COD".to_owned(),
                created_at: "2025-03-01T12:00:00Z".to_owned(),
            },
            order_update: OrderUpdate {
                order_id: request.order_id.clone(),
                status: OrderStatus::Confirmed,
            },
            inventory_release: None,
        })
    }

    async fn get_payment(&self, payment: &PaymentId) -> Result<serde_json::Value, ApiError> {
        Ok(json!({ "paymentId": payment.as_str(), "status": "SUCCESS" }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notification stub
// ─────────────────────────────────────────────────────────────────────────────

/// Stub notification service counting trigger calls.
pub struct StubNotifications {
    pub fail: AtomicBool,
    pub order_confirmed_calls: AtomicUsize,
    pub user_registered_calls: AtomicUsize,
    pub payment_failed_calls: AtomicUsize,
}

impl StubNotifications {
    /// A stub that accepts every trigger.
    #[must_use]
    pub fn accepting() -> Self {
        Self {
            fail: AtomicBool::new(false),
            order_confirmed_calls: AtomicUsize::new(0),
            user_registered_calls: AtomicUsize::new(0),
            payment_failed_calls: AtomicUsize::new(0),
        }
    }

    fn respond(&self, kind: &str, to_email: &str) -> Result<NotificationResponse, ApiError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(remote_error("notification service unavailable"));
        }
        Ok(NotificationResponse {
            message: "sent".to_owned(),
            kind: kind.to_owned(),
            to_email: to_email.to_owned(),
        })
    }
}

#[async_trait]
impl NotificationApi for StubNotifications {
    async fn order_confirmed(
        &self,
        data: &OrderConfirmation,
    ) -> Result<NotificationResponse, ApiError> {
        self.order_confirmed_calls.fetch_add(1, Ordering::SeqCst);
        self.respond("ORDER_CONFIRMED", data.email.as_str())
    }

    async fn user_registered(
        &self,
        email: &Email,
        _user: &UserId,
    ) -> Result<NotificationResponse, ApiError> {
        self.user_registered_calls.fetch_add(1, Ordering::SeqCst);
        self.respond("USER_REGISTERED", email.as_str())
    }

    async fn payment_failed(
        &self,
        email: &Email,
        _user: &UserId,
        _order: &OrderId,
    ) -> Result<NotificationResponse, ApiError> {
        self.payment_failed_calls.fetch_add(1, Ordering::SeqCst);
        self.respond("PAYMENT_FAILED", email.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// The fallback checkout email used across scenario tests.
#[must_use]
pub fn fallback_email() -> Email {
    Email::parse("orders@retailcloud.dev").unwrap()
}

/// The demo user id used across scenario tests.
#[must_use]
pub fn demo_user() -> UserId {
    UserId::new("demo-user")
}

/// A pending order with one widget line, totalling 19.98.
#[must_use]
pub fn widget_order(order_id: &str) -> Order {
    serde_json::from_value(json!({
        "orderId": order_id,
        "status": "PENDING",
        "items": [{ "productId": "P1", "name": "Widget", "price": 9.99, "qty": 2 }],
        "totalAmount": 19.98
    }))
    .unwrap()
}
