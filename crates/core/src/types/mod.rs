//! Core types for Brana.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod locale;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use locale::{Locale, LocalizedText};
pub use price::{CurrencyCode, Price};
pub use status::*;
