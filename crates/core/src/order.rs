//! Orders and checkout totals.
//!
//! An [`Order`] is a frozen snapshot of the cart, the shipping address and the
//! computed totals at the moment of checkout.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLineItem};
use crate::types::{CurrencyCode, OrderId, OrderStatus, UserId};

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    BankTransfer,
    Telebirr,
}

impl PaymentMethod {
    /// Database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::BankTransfer => "bank_transfer",
            Self::Telebirr => "telebirr",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            "bank_transfer" => Ok(Self::BankTransfer),
            "telebirr" => Ok(Self::Telebirr),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub country: String,
}

impl ShippingAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Shipping and tax rules applied at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    pub currency: CurrencyCode,
    /// Fraction of the subtotal charged as tax (0.15 = 15%).
    pub tax_rate: Decimal,
    /// Flat shipping fee per order.
    pub shipping_flat: Decimal,
    /// Subtotal at or above which shipping is free.
    pub free_shipping_over: Option<Decimal>,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::ETB,
            tax_rate: Decimal::new(15, 2),
            shipping_flat: Decimal::new(150, 0),
            free_shipping_over: Some(Decimal::new(2000, 0)),
        }
    }
}

/// Computed order amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals for a cart. Tax is levied on the subtotal only and
    /// rounded to two decimal places.
    #[must_use]
    pub fn compute(cart: &Cart, policy: &PricingPolicy) -> Self {
        let subtotal = cart.subtotal();
        let shipping = if cart.is_empty()
            || policy
                .free_shipping_over
                .is_some_and(|threshold| subtotal >= threshold)
        {
            Decimal::ZERO
        } else {
            policy.shipping_flat
        };
        let tax = (subtotal * policy.tax_rate).round_dp(2);

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<CartLineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub currency: CurrencyCode,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_worth(amount: i64) -> Cart {
        Cart::from_items([CartLineItem::new(
            "p1",
            "Facsimile",
            Some(Decimal::new(amount, 0)),
            1,
        )])
    }

    #[test]
    fn test_totals_with_flat_shipping() {
        let totals = OrderTotals::compute(&cart_worth(450), &PricingPolicy::default());
        assert_eq!(totals.subtotal, Decimal::new(450, 0));
        assert_eq!(totals.shipping, Decimal::new(150, 0));
        assert_eq!(totals.tax, Decimal::new(6750, 2));
        assert_eq!(totals.total, Decimal::new(66750, 2));
    }

    #[test]
    fn test_free_shipping_threshold_is_inclusive() {
        let totals = OrderTotals::compute(&cart_worth(2000), &PricingPolicy::default());
        assert_eq!(totals.shipping, Decimal::ZERO);
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let totals = OrderTotals::compute(&Cart::new(), &PricingPolicy::default());
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_missing_address_fields() {
        let address = ShippingAddress {
            full_name: "Abebe".to_string(),
            phone: " ".to_string(),
            street: "Churchill Ave".to_string(),
            city: String::new(),
            region: None,
            country: "ET".to_string(),
        };
        assert_eq!(address.missing_fields(), vec!["phone", "city"]);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("telebirr".parse::<PaymentMethod>(), Ok(PaymentMethod::Telebirr));
        assert!("card".parse::<PaymentMethod>().is_err());
    }
}
