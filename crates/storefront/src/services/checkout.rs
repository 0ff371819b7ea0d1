//! Checkout: turn the owner's cart into an order.

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use brana_core::{Order, OrderTotals, PaymentMethod, PricingPolicy, ShippingAddress, UserId};

use crate::db::{OrderStore, RepositoryError};
use crate::models::NewOrder;
use crate::services::cart::{CartError, CartService};

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Required shipping fields are blank.
    #[error("missing shipping fields: {0:?}")]
    MissingFields(Vec<&'static str>),

    /// Reading the cart failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Storing the order failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Checkout request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// Place an order for everything in the owner's cart.
///
/// Totals are computed from the cart snapshot. Once the order is stored the
/// cart is cleared; a failure to clear is logged and does not undo the order.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if the cart has no lines and
/// `CheckoutError::MissingFields` if the shipping address is incomplete.
#[instrument(skip(carts, orders, pricing, request), fields(payment = %request.payment_method))]
pub async fn place_order(
    carts: &CartService<'_>,
    orders: &dyn OrderStore,
    pricing: &PricingPolicy,
    owner: UserId,
    request: CheckoutRequest,
) -> Result<Order, CheckoutError> {
    let missing = request.shipping_address.missing_fields();
    if !missing.is_empty() {
        return Err(CheckoutError::MissingFields(missing));
    }

    let cart = carts.get(owner).await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let totals = OrderTotals::compute(&cart, pricing);
    let order = orders
        .create(NewOrder {
            user_id: owner,
            items: cart.into_items(),
            shipping_address: request.shipping_address,
            payment_method: request.payment_method,
            currency: pricing.currency,
            totals,
        })
        .await?;
    tracing::info!(order_id = %order.id, total = %order.totals.total, "Order placed");

    if let Err(e) = carts.clear(owner).await {
        tracing::warn!(order_id = %order.id, error = %e, "Failed to clear cart after checkout");
    }

    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use brana_core::{Bus, CartLineItem, OrderStatus};
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::{CartStore, MemoryStore};
    use crate::services::catalog::Catalog;

    const OWNER: UserId = UserId::new(3);

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: ShippingAddress {
                full_name: "Abebe Kebede".to_string(),
                phone: "+251911000000".to_string(),
                street: "Churchill Road".to_string(),
                city: "Addis Ababa".to_string(),
                region: None,
                country: "Ethiopia".to_string(),
            },
            payment_method: PaymentMethod::Telebirr,
        }
    }

    #[tokio::test]
    async fn test_checkout_snapshots_totals_and_clears_cart() {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(store.clone());
        let bus = Bus::new(8);
        let carts = CartService::new(store.as_ref(), &catalog, &bus);
        store
            .add_item(
                OWNER,
                CartLineItem::new("p1", "Psalter", Some(Decimal::new(450, 0)), 2),
            )
            .await
            .unwrap();

        let order = place_order(
            &carts,
            store.as_ref(),
            &PricingPolicy::default(),
            OWNER,
            request(),
        )
        .await
        .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.totals.subtotal, Decimal::new(900, 0));
        assert_eq!(order.totals.shipping, Decimal::new(150, 0));
        assert_eq!(order.totals.tax, Decimal::new(13500, 2));
        assert!(store.load(OWNER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(store.clone());
        let bus = Bus::new(8);
        let carts = CartService::new(store.as_ref(), &catalog, &bus);

        let err = place_order(
            &carts,
            store.as_ref(),
            &PricingPolicy::default(),
            OWNER,
            request(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_incomplete_address_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(store.clone());
        let bus = Bus::new(8);
        let carts = CartService::new(store.as_ref(), &catalog, &bus);
        let mut incomplete = request();
        incomplete.shipping_address.city = "  ".to_string();

        let err = place_order(
            &carts,
            store.as_ref(),
            &PricingPolicy::default(),
            OWNER,
            incomplete,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CheckoutError::MissingFields(fields) if fields == vec!["city"]));
    }
}
