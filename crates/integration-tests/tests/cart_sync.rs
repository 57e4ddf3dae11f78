//! Cart synchronization scenarios against stub collaborators.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;

use retailcloud_client::cart::{CartState, CartSyncError};
use retailcloud_core::ProductId;
use retailcloud_integration_tests::{CartShape, StubCart, demo_user};

fn two_line_cart() -> Vec<serde_json::Value> {
    vec![
        json!({ "productId": "P1", "name": "Widget", "price": 9.99, "qty": 2 }),
        json!({ "productId": "P2", "name": "Gadget", "price": 4.50, "qty": 3 }),
    ]
}

#[tokio::test]
async fn item_count_matches_for_all_three_response_shapes() {
    for shape in [CartShape::Bare, CartShape::Items, CartShape::CartItems] {
        let stub = Arc::new(StubCart::empty(shape));
        stub.seed(two_line_cart());
        let cart = CartState::new(stub);

        cart.load(&demo_user()).await.expect("load");

        assert_eq!(cart.item_count(), 5, "shape {shape:?}");
        assert_eq!(cart.lines().len(), 2, "shape {shape:?}");
    }
}

#[tokio::test]
async fn load_failure_keeps_lines_but_zeroes_count() {
    let stub = Arc::new(StubCart::empty(CartShape::Items));
    stub.seed(two_line_cart());
    let cart = CartState::new(stub.clone());

    cart.load(&demo_user()).await.expect("first load");
    assert_eq!(cart.item_count(), 5);

    stub.fail_get.store(true, Ordering::SeqCst);
    let err = cart.load(&demo_user()).await.unwrap_err();

    assert!(matches!(err, CartSyncError::Remote(msg) if msg == "cart service unavailable"));
    // Previous lines survive for the open page; the badge count does not.
    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.item_count(), 0);
}

#[tokio::test]
async fn add_item_reloads_server_truth() {
    let stub = Arc::new(StubCart::empty(CartShape::Bare));
    let cart = CartState::new(stub.clone());
    let user = demo_user();

    cart.add_item(&user, &ProductId::new("P1"), 2, "9.99".parse().unwrap())
        .await
        .expect("add");

    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.subtotal(), "19.98".parse().unwrap());
    // The count came from a reload, not client arithmetic.
    assert_eq!(stub.add_calls.load(Ordering::SeqCst), 1);
    assert!(stub.get_calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn remove_item_drops_line_locally_and_refreshes_count() {
    let stub = Arc::new(StubCart::empty(CartShape::Items));
    stub.seed(two_line_cart());
    let cart = CartState::new(stub.clone());
    let user = demo_user();

    cart.load(&user).await.expect("load");
    cart.remove_item(&user, &ProductId::new("P1"))
        .await
        .expect("remove");

    let lines = cart.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].product_id.as_str(), "P2");
    // Count reconciled against the server's post-remove state.
    assert_eq!(cart.item_count(), 3);
    assert_eq!(stub.server_len(), 1);
}

#[tokio::test]
async fn clear_empties_local_state() {
    let stub = Arc::new(StubCart::empty(CartShape::Items));
    stub.seed(two_line_cart());
    let cart = CartState::new(stub.clone());
    let user = demo_user();

    cart.load(&user).await.expect("load");
    cart.clear(&user).await.expect("clear");

    assert!(cart.lines().is_empty());
    assert_eq!(cart.item_count(), 0);
    assert_eq!(stub.clear_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn update_qty_removes_then_adds() {
    let stub = Arc::new(StubCart::empty(CartShape::Bare));
    stub.seed(vec![json!({
        "productId": "P1", "name": "Widget", "price": 9.99, "qty": 1
    })]);
    let cart = CartState::new(stub.clone());
    let user = demo_user();

    cart.load(&user).await.expect("load");
    cart.update_qty(&user, &ProductId::new("P1"), 4, "9.99".parse().unwrap())
        .await
        .expect("update");

    assert_eq!(stub.remove_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.add_calls.load(Ordering::SeqCst), 1);
    assert_eq!(cart.item_count(), 4);
}

#[tokio::test]
async fn overlapping_mutations_are_rejected() {
    let stub = Arc::new(StubCart::empty(CartShape::Bare));
    *stub.mutation_delay.lock().unwrap() = Some(Duration::from_millis(50));
    let cart = Arc::new(CartState::new(stub));
    let user = demo_user();

    let price: rust_decimal::Decimal = "9.99".parse().unwrap();
    let p1 = ProductId::new("P1");
    let p2 = ProductId::new("P2");
    let first = cart.add_item(&user, &p1, 1, price);
    let second = cart.add_item(&user, &p2, 1, price);
    let (first, second) = tokio::join!(first, second);

    // Exactly one of the overlapping calls goes through.
    let busy_count = [&first, &second]
        .iter()
        .filter(|result| matches!(result, Err(CartSyncError::Busy)))
        .count();
    assert_eq!(busy_count, 1);
    assert!(first.is_ok() || second.is_ok());
    assert!(!cart.is_busy());
}

#[tokio::test]
async fn count_broadcast_shares_one_value_across_observers() {
    let stub = Arc::new(StubCart::empty(CartShape::Bare));
    stub.seed(two_line_cart());
    let cart = CartState::new(stub);

    let badge = cart.subscribe_count();
    let summary = cart.subscribe_count();

    cart.load(&demo_user()).await.expect("load");

    assert_eq!(*badge.borrow(), 5);
    assert_eq!(*summary.borrow(), 5);
}
