//! Core types for RetailCloud.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod status;

pub use cart::{CartLine, cart_item_count, cart_total};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, PaymentAttempt};
pub use status::{OrderStatus, PaymentStatus};
