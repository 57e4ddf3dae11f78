//! Cart commands: list, add, remove, clear.

#![allow(clippy::print_stdout)]

use rust_decimal::Decimal;

use retailcloud_client::cart::CartSyncError;
use retailcloud_core::ProductId;

use super::App;

/// Show the cart contents.
pub async fn list(app: &App) -> Result<(), CartSyncError> {
    app.cart.load(&app.config.demo_user).await?;

    let lines = app.cart.lines();
    if lines.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }

    for line in &lines {
        println!(
            "{:<12} {:<24} {:>3} x {:>8}  = {:>8}",
            line.product_id.as_str(),
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total().to_string()
        );
    }
    println!(
        "{} item(s), subtotal {}",
        app.cart.item_count(),
        app.cart.subtotal()
    );

    Ok(())
}

/// Add an item to the cart.
pub async fn add(app: &App, product: &str, qty: u32, price: Decimal) -> Result<(), CartSyncError> {
    let product = ProductId::new(product);
    app.cart
        .add_item(&app.config.demo_user, &product, qty, price)
        .await?;
    println!("Added {qty} x {product}. Cart now holds {} item(s).", app.cart.item_count());
    Ok(())
}

/// Remove an item from the cart.
pub async fn remove(app: &App, product: &str) -> Result<(), CartSyncError> {
    let product = ProductId::new(product);
    app.cart.remove_item(&app.config.demo_user, &product).await?;
    println!("Removed {product}. Cart now holds {} item(s).", app.cart.item_count());
    Ok(())
}

/// Clear the cart.
pub async fn clear(app: &App) -> Result<(), CartSyncError> {
    app.cart.clear(&app.config.demo_user).await?;
    println!("Cart cleared.");
    Ok(())
}
