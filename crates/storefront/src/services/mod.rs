//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Account registration and login (argon2)
//! - `cart` - Cart mutations and change events
//! - `catalog` - Cached product lookups
//! - `checkout` - Order placement from the cart

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
