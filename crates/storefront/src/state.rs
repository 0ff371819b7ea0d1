//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use brana_core::Bus;

use crate::config::StorefrontConfig;
use crate::db::Stores;
use crate::services::cart::{CartEvent, CartService};
use crate::services::catalog::Catalog;

/// Capacity of the cart event channel. Subscribers further behind than
/// this skip ahead and observe a lag count.
const CART_EVENT_CAPACITY: usize = 256;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the stores, the catalog cache and the event bus.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    stores: Stores,
    catalog: Catalog,
    cart_events: Bus<CartEvent>,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// `pool` is only used for readiness checks; pass `None` when running
    /// against in-memory stores.
    #[must_use]
    pub fn new(config: StorefrontConfig, stores: Stores, pool: Option<PgPool>) -> Self {
        let catalog = Catalog::new(stores.products.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                catalog,
                cart_events: Bus::new(CART_EVENT_CAPACITY),
                pool,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the persistence stores.
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    /// Get the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get the cart event bus.
    #[must_use]
    pub fn cart_events(&self) -> &Bus<CartEvent> {
        &self.inner.cart_events
    }

    /// Get the database pool, if running against `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Cart operations bound to this state.
    #[must_use]
    pub fn carts(&self) -> CartService<'_> {
        CartService::new(
            self.inner.stores.carts.as_ref(),
            &self.inner.catalog,
            &self.inner.cart_events,
        )
    }
}
