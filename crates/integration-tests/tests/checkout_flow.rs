//! Checkout pipeline scenarios against stub collaborators.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use retailcloud_client::cart::CartState;
use retailcloud_client::checkout::{CheckoutError, CheckoutOrchestrator, CheckoutStage};
use retailcloud_client::session::SessionStore;
use retailcloud_client::storage::MemoryStorage;
use retailcloud_core::{OrderId, PaymentStatus};
use retailcloud_integration_tests::{
    CartShape, StubAuth, StubCart, StubNotifications, StubOrders, StubPayments, demo_user,
    fallback_email, future_exp, identity_token, widget_order,
};

/// Everything a checkout scenario needs, wired against stubs.
struct Flow {
    session: Arc<SessionStore>,
    cart: Arc<CartState>,
    cart_stub: Arc<StubCart>,
    orders: Arc<StubOrders>,
    payments: Arc<StubPayments>,
    notifications: Arc<StubNotifications>,
    orchestrator: CheckoutOrchestrator,
}

fn flow_with_token(id_token: String) -> Flow {
    let orders = Arc::new(StubOrders::new());
    let payments = Arc::new(StubPayments::settling());
    let notifications = Arc::new(StubNotifications::accepting());
    let cart_stub = Arc::new(StubCart::empty(CartShape::Items));

    let session = Arc::new(SessionStore::new(
        Arc::new(StubAuth::issuing(id_token)),
        notifications.clone(),
        Arc::new(MemoryStorage::new()),
    ));
    let cart = Arc::new(CartState::new(cart_stub.clone()));

    let orchestrator = CheckoutOrchestrator::new(
        orders.clone(),
        payments.clone(),
        notifications.clone(),
        session.clone(),
        cart.clone(),
        fallback_email(),
    );

    Flow {
        session,
        cart,
        cart_stub,
        orders,
        payments,
        notifications,
        orchestrator,
    }
}

fn flow() -> Flow {
    flow_with_token(identity_token("u1", Some("a@x.com"), future_exp()))
}

async fn logged_in_flow() -> Flow {
    let flow = flow();
    flow.session.login("a@x.com", "pw").await.expect("login");
    flow
}

#[tokio::test]
async fn checkout_without_auth_makes_no_remote_calls() {
    let flow = flow();

    let err = flow.orchestrator.checkout(&demo_user()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::AuthRequired));
    assert_eq!(flow.orders.checkout_calls.load(Ordering::SeqCst), 0);
    assert_eq!(flow.orchestrator.stage(), CheckoutStage::CartLoaded);
}

#[tokio::test]
async fn checkout_creates_order_and_clears_cart() {
    let flow = logged_in_flow().await;
    let user = demo_user();

    flow.cart_stub.seed(vec![serde_json::json!({
        "productId": "P1", "name": "Widget", "price": 9.99, "qty": 2
    })]);
    flow.cart.load(&user).await.expect("load cart");
    assert_eq!(flow.cart.item_count(), 2);

    flow.orders.mint_on_checkout(widget_order("O-1"));
    let order = flow.orchestrator.checkout(&user).await.expect("checkout");

    assert_eq!(order.order_id.as_str(), "O-1");
    assert_eq!(
        flow.orchestrator.stage(),
        CheckoutStage::OrderCreated(OrderId::new("O-1"))
    );
    // The checkout email came from the identity claims.
    assert_eq!(
        flow.orders.last_checkout_email.lock().unwrap().as_deref(),
        Some("a@x.com")
    );
    // Local cart empties without waiting for the remote clear...
    assert_eq!(flow.cart.item_count(), 0);
    assert!(flow.cart.lines().is_empty());
    // ...which lands fire-and-forget.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(flow.cart_stub.clear_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn checkout_falls_back_to_configured_email() {
    // Identity without an email claim.
    let flow = flow_with_token(identity_token("u1", None, future_exp()));
    flow.session.login("a@x.com", "pw").await.expect("login");

    flow.orders.mint_on_checkout(widget_order("O-1"));
    flow.orchestrator
        .checkout(&demo_user())
        .await
        .expect("checkout");

    assert_eq!(
        flow.orders.last_checkout_email.lock().unwrap().as_deref(),
        Some(fallback_email().as_str())
    );
}

#[tokio::test]
async fn checkout_failure_stays_before_order_creation() {
    let flow = logged_in_flow().await;
    let user = demo_user();

    flow.cart_stub.seed(vec![serde_json::json!({
        "productId": "P1", "price": 9.99, "qty": 2
    })]);
    flow.cart.load(&user).await.expect("load cart");

    flow.orders.fail_checkout.store(true, Ordering::SeqCst);
    let err = flow.orchestrator.checkout(&user).await.unwrap_err();

    assert!(matches!(err, CheckoutError::CheckoutFailed(msg) if msg == "order creation failed"));
    assert_eq!(flow.orchestrator.stage(), CheckoutStage::CartLoaded);
    // The cart was not touched.
    assert_eq!(flow.cart.item_count(), 2);
}

#[tokio::test]
async fn load_order_reconstructs_pipeline_from_server_state() {
    // A fresh orchestrator with no in-memory pipeline state, as after a
    // process restart: only {is_authenticated, order_id} exist.
    let flow = logged_in_flow().await;
    *flow.orders.orders.lock().unwrap() = vec![widget_order("O-1")];

    let order = flow
        .orchestrator
        .load_order(&demo_user(), &OrderId::new("O-1"))
        .await
        .expect("load order");

    assert_eq!(order.order_id.as_str(), "O-1");
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total_amount, "19.98".parse().unwrap());
    assert_eq!(
        flow.orchestrator.stage(),
        CheckoutStage::OrderCreated(OrderId::new("O-1"))
    );
}

#[tokio::test]
async fn load_order_reports_missing_orders() {
    let flow = logged_in_flow().await;
    *flow.orders.orders.lock().unwrap() = vec![widget_order("O-1")];

    let err = flow
        .orchestrator
        .load_order(&demo_user(), &OrderId::new("O-999"))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::OrderNotFound(id) if id.as_str() == "O-999"));
    assert_eq!(flow.orchestrator.stage(), CheckoutStage::CartLoaded);
}

#[tokio::test]
async fn pay_twice_settles_both_times() {
    let flow = logged_in_flow().await;
    let user = demo_user();
    *flow.orders.orders.lock().unwrap() = vec![widget_order("O-1")];
    let order_id = OrderId::new("O-1");

    flow.orchestrator
        .load_order(&user, &order_id)
        .await
        .expect("load order");

    let first = flow.orchestrator.pay(&user, &order_id).await.expect("pay");
    let second = flow.orchestrator.pay(&user, &order_id).await.expect("pay again");

    assert_eq!(first.payment.order_id, order_id);
    assert_eq!(second.payment.order_id, order_id);
    assert_eq!(
        flow.orchestrator.stage(),
        CheckoutStage::PaymentSettled(order_id.clone())
    );
    assert_eq!(flow.payments.pay_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        flow.orchestrator.last_attempt().unwrap().outcome,
        PaymentStatus::Success
    );
}

#[tokio::test]
async fn pay_failure_keeps_order_created_and_is_retryable() {
    let flow = logged_in_flow().await;
    let user = demo_user();
    *flow.orders.orders.lock().unwrap() = vec![widget_order("O-1")];
    let order_id = OrderId::new("O-1");

    flow.orchestrator
        .load_order(&user, &order_id)
        .await
        .expect("load order");

    flow.payments.fail.store(true, Ordering::SeqCst);
    let err = flow.orchestrator.pay(&user, &order_id).await.unwrap_err();

    assert!(matches!(err, CheckoutError::PaymentFailed(_)));
    assert_eq!(
        flow.orchestrator.stage(),
        CheckoutStage::OrderCreated(order_id.clone())
    );
    assert_eq!(
        flow.orchestrator.last_attempt().unwrap().outcome,
        PaymentStatus::Failed
    );

    // The failed attempt triggers the payment-failed email fire-and-forget.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(flow.notifications.payment_failed_calls.load(Ordering::SeqCst), 1);

    // Retrying the same order id succeeds once the service recovers.
    flow.payments.fail.store(false, Ordering::SeqCst);
    flow.orchestrator.pay(&user, &order_id).await.expect("retry");
    assert_eq!(
        flow.orchestrator.stage(),
        CheckoutStage::PaymentSettled(order_id)
    );
}

#[tokio::test]
async fn pay_rejects_unknown_order_ids() {
    let flow = logged_in_flow().await;

    let err = flow
        .orchestrator
        .pay(&demo_user(), &OrderId::new("O-1"))
        .await
        .unwrap_err();

    // No order was created or loaded, so payment is never attempted.
    assert!(matches!(err, CheckoutError::OrderNotFound(_)));
    assert_eq!(flow.payments.pay_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn settled_payment_triggers_order_confirmation() {
    let flow = logged_in_flow().await;
    let user = demo_user();
    *flow.orders.orders.lock().unwrap() = vec![widget_order("O-1")];
    let order_id = OrderId::new("O-1");

    flow.orchestrator
        .load_order(&user, &order_id)
        .await
        .expect("load order");
    flow.orchestrator.pay(&user, &order_id).await.expect("pay");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        flow.notifications.order_confirmed_calls.load(Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn overlapping_pay_calls_are_rejected() {
    let flow = logged_in_flow().await;
    let user = demo_user();
    *flow.orders.orders.lock().unwrap() = vec![widget_order("O-1")];
    let order_id = OrderId::new("O-1");

    flow.orchestrator
        .load_order(&user, &order_id)
        .await
        .expect("load order");

    *flow.payments.delay.lock().unwrap() = Some(Duration::from_millis(50));
    let first = flow.orchestrator.pay(&user, &order_id);
    let second = flow.orchestrator.pay(&user, &order_id);
    let (first, second) = tokio::join!(first, second);

    let busy_count = [&first, &second]
        .iter()
        .filter(|result| matches!(result, Err(CheckoutError::Busy)))
        .count();
    assert_eq!(busy_count, 1);
    assert!(first.is_ok() || second.is_ok());
    assert!(!flow.orchestrator.is_busy());
}
