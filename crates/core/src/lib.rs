//! Brana Core - Shared domain types and cart logic.
//!
//! This crate provides the types used across all Brana components:
//! - `storefront` - JSON API for the catalog, cart, checkout and admin dashboard
//! - `cart-client` - Guest/authenticated cart facade used by front-ends
//! - `cli` - Command-line tools for migrations, seeding and admin users
//!
//! # Architecture
//!
//! The core crate contains only types, pure algorithms and an in-process
//! notification bus - no database access and no HTTP clients. Both the server
//! and the client apply cart mutations through the same [`Cart`] algebra, so the
//! guest cart and the per-user cart can never drift in shape.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, locales and statuses
//! - [`cart`] - Cart line items, cart commands and their compensating inverses
//! - [`order`] - Order snapshots and checkout totals
//! - [`bus`] - Typed publish/subscribe channel for cart notifications

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bus;
pub mod cart;
pub mod order;
pub mod types;

pub use bus::{Bus, Subscription};
pub use cart::{Cart, CartCommand, CartLineItem, MAX_LINE_QUANTITY, clamp_quantity};
pub use order::{Order, OrderTotals, PaymentMethod, PricingPolicy, ShippingAddress};
pub use types::*;
