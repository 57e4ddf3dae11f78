//! Order lifecycle commands: checkout, orders, pay.

#![allow(clippy::print_stdout)]

use retailcloud_client::checkout::CheckoutError;
use retailcloud_core::OrderId;

use super::App;

/// Convert the cart into an order.
pub async fn checkout(app: &App) -> Result<(), CheckoutError> {
    match app.checkout.checkout(&app.config.demo_user).await {
        Ok(order) => {
            println!(
                "Order {} created ({} item(s), total {}).",
                order.order_id,
                order.items.len(),
                order.total_amount
            );
            println!("Settle it with: retail pay {}", order.order_id);
            Ok(())
        }
        Err(CheckoutError::AuthRequired) => {
            println!("Sign in first: retail login -e <email> -p <password>");
            Err(CheckoutError::AuthRequired)
        }
        Err(e) => Err(e),
    }
}

/// List past orders.
pub async fn list(app: &App) -> Result<(), CheckoutError> {
    // Reuse the orchestrator's recovery path shape: fetch and print the list.
    let orders = app
        .checkout
        .order_history(&app.config.demo_user)
        .await?;

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in &orders {
        println!(
            "{:<16} {:?}  {} item(s)  total {}",
            order.order_id.as_str(),
            order.status,
            order.items.len(),
            order.total_amount
        );
    }

    Ok(())
}

/// Settle payment for an order.
pub async fn pay(app: &App, order_id: &str) -> Result<(), CheckoutError> {
    let order_id = OrderId::new(order_id);
    let user = &app.config.demo_user;

    // Re-entrant path: rebuild the pipeline from server state first, exactly
    // as a reloaded payment page would.
    let order = app.checkout.load_order(user, &order_id).await?;
    println!(
        "Paying order {} ({} item(s), total {})...",
        order.order_id,
        order.items.len(),
        order.total_amount
    );

    let receipt = app.checkout.pay(user, &order_id).await?;
    println!(
        "Payment {} settled via {}. Order status: {:?}.",
        receipt.payment.payment_id, receipt.payment.provider, receipt.order_update.status
    );

    Ok(())
}
