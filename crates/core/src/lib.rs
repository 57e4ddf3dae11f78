//! RetailCloud Core - Shared types library.
//!
//! This crate provides common types used across the RetailCloud client
//! components:
//! - `client` - Session, cart and checkout coordination library
//! - `cli` - Command-line shopper frontend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails, cart lines,
//!   orders, and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
