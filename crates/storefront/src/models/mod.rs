//! Domain models for the storefront.
//!
//! Validated domain objects, separate from database row types. Cart and order
//! types shared with the cart client live in `brana-core`.

pub mod message;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use message::{ContactMessage, NewContactMessage, SubscribeOutcome, Subscriber};
pub use order::{NewOrder, OrderSummary};
pub use product::Product;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
