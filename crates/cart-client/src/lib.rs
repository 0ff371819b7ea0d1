//! Brana cart client.
//!
//! The cart a front-end holds, whether or not the shopper is signed in:
//!
//! - [`local`] - guest cart in browser-style key/value storage
//! - [`remote`] - signed-in cart via the storefront's `/api/cart` routes
//! - [`facade`] - one API over both, with optimistic updates, rollback and the
//!   merge of the guest cart at login
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use brana_cart_client::{CartFacade, FileStorage, HttpRemoteCart, LocalCart};
//!
//! let remote = Arc::new(HttpRemoteCart::new("https://shop.brana.org")?);
//! let local = LocalCart::new(Arc::new(FileStorage::new(".brana")));
//! let cart = CartFacade::new(local, remote.clone());
//!
//! cart.add(line_item).await?;          // stored locally
//! remote.login(email, password).await?;
//! cart.sign_in().await?;               // merged into the server cart
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod facade;
pub mod local;
pub mod remote;

pub use error::ClientError;
pub use facade::{CartChanged, CartFacade, CartSource, ChangeReason, MergeOutcome};
pub use local::{CART_KEY, FileStorage, LocalCart, LocalStorage, MemoryStorage};
pub use remote::{DEFAULT_TIMEOUT, HttpRemoteCart, RemoteCart, SessionUser};
